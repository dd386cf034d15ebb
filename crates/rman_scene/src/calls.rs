//! The interface call table.
//!
//! Each entry lists a call's positional arguments in interface order; `[params]`
//! marks calls with a trailing token/value list. Everything derived from a
//! call (the [`RiCall`] variant, the callback triplet, dispatch and RIB
//! arguments) is generated from this table.
//!
//! Context lifecycle (`Begin`, `End`, `Context`) and `Control` are handled by
//! the context layer and have no variant here.

use glam::{Mat4, Vec3};

use rman_core::{Basis, Bound, LightHandle, ObjectHandle, ParameterList, Request, Result, Token};
use rman_state::{ColorValue, RenderState, TrimCurve};

use crate::command::RiCommand;
use crate::macros::define_calls;
use crate::procedural::Procedural;

/// The three dispatch phases of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Validation and state bookkeeping shared by all back ends.
    Pre,
    /// The back end specific effect.
    Do,
    /// Cleanup and propagation.
    Post,
}

define_calls! {
    // ========================================================================
    // Blocks
    // ========================================================================
    FrameBegin { number: i32 },
    FrameEnd {},
    WorldBegin {},
    WorldEnd {},
    AttributeBegin {},
    AttributeEnd {},
    TransformBegin {},
    TransformEnd {},
    SolidBegin { operation: Token },
    SolidEnd {},
    /// Opens an object definition; `handle` is assigned by the context.
    ObjectBegin { handle: ObjectHandle },
    ObjectEnd {},
    MotionBegin { times: Vec<f32> },
    MotionEnd {},
    ArchiveBegin [params] { name: Token },
    ArchiveEnd {},
    ResourceBegin {},
    ResourceEnd {},

    // ========================================================================
    // Utility
    // ========================================================================
    Declare { name: Token, declaration: String },
    ErrorHandler { handler: Token },
    System { command: String },
    Resource [params] { name: Token, ty: Token },
    ReadArchive [params] { name: Token },
    /// `ty` is `"comment"`, `"structure"` or `"verbatim"`.
    ArchiveRecord { ty: Token, line: String },

    // ========================================================================
    // Options
    // ========================================================================
    Format { x_resolution: i32, y_resolution: i32, pixel_aspect: f32 },
    FrameAspectRatio { ratio: f32 },
    ScreenWindow { left: f32, right: f32, bottom: f32, top: f32 },
    CropWindow { xmin: f32, xmax: f32, ymin: f32, ymax: f32 },
    Projection [params] { name: Token },
    Clipping { near: f32, far: f32 },
    ClippingPlane { x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32 },
    DepthOfField { fstop: f32, focal_length: f32, focal_distance: f32 },
    Shutter { open: f32, close: f32 },
    PixelVariance { variance: f32 },
    PixelSamples { xsamples: f32, ysamples: f32 },
    PixelFilter { filter: Token, xwidth: f32, ywidth: f32 },
    Exposure { gain: f32, gamma: f32 },
    Imager [params] { name: Token },
    Quantize { ty: Token, one: i32, min: i32, max: i32, dither_amplitude: f32 },
    Display [params] { name: String, ty: Token, mode: Token },
    Hider [params] { ty: Token },
    /// `n_rgb` and `rgb_n` both hold `n * 3` values.
    ColorSamples { n_rgb: Vec<f32>, rgb_n: Vec<f32> },
    RelativeDetail { relative_detail: f32 },
    Option [params] { name: Token },

    // ========================================================================
    // Attributes
    // ========================================================================
    Attribute [params] { name: Token },
    Color { color: ColorValue },
    Opacity { opacity: ColorValue },
    TextureCoordinates { s1: f32, t1: f32, s2: f32, t2: f32, s3: f32, t3: f32, s4: f32, t4: f32 },
    LightSource [params] { name: Token, handle: LightHandle },
    AreaLightSource [params] { name: Token, handle: LightHandle },
    Illuminate { light: LightHandle, on: bool },
    Surface [params] { name: Token },
    Atmosphere [params] { name: Token },
    Interior [params] { name: Token },
    Exterior [params] { name: Token },
    Displacement [params] { name: Token },
    Deformation [params] { name: Token },
    ShadingRate { size: f32 },
    ShadingInterpolation { ty: Token },
    Matte { on: bool },
    Bound { bound: Bound },
    Detail { bound: Bound },
    DetailRange { min_visible: f32, lower_transition: f32, upper_transition: f32, max_visible: f32 },
    GeometricApproximation { ty: Token, value: f32 },
    Orientation { orientation: Token },
    ReverseOrientation {},
    Sides { sides: i32 },
    Basis { u_basis: Basis, v_basis: Basis },
    TrimCurve { curve: TrimCurve },

    // ========================================================================
    // Transformations
    // ========================================================================
    Identity {},
    Transform { matrix: Mat4 },
    ConcatTransform { matrix: Mat4 },
    Perspective { fov: f32 },
    Translate { dx: f32, dy: f32, dz: f32 },
    Rotate { angle: f32, dx: f32, dy: f32, dz: f32 },
    Scale { sx: f32, sy: f32, sz: f32 },
    Skew { angle: f32, dx1: f32, dy1: f32, dz1: f32, dx2: f32, dy2: f32, dz2: f32 },
    CoordinateSystem { space: Token },
    ScopedCoordinateSystem { space: Token },
    CoordSysTransform { space: Token },

    // ========================================================================
    // Geometric primitives
    // ========================================================================
    /// The vertex count is implied by the length of `"P"`.
    Polygon [params] {},
    GeneralPolygon [params] { nverts: Vec<i32> },
    PointsPolygons [params] { nverts: Vec<i32>, verts: Vec<i32> },
    PointsGeneralPolygons [params] { nloops: Vec<i32>, nverts: Vec<i32>, verts: Vec<i32> },
    Patch [params] { ty: Token },
    PatchMesh [params] { ty: Token, nu: i32, uwrap: Token, nv: i32, vwrap: Token },
    NuPatch [params] {
        nu: i32, uorder: i32, uknot: Vec<f32>, umin: f32, umax: f32,
        nv: i32, vorder: i32, vknot: Vec<f32>, vmin: f32, vmax: f32,
    },
    Sphere [params] { radius: f32, zmin: f32, zmax: f32, thetamax: f32 },
    Cone [params] { height: f32, radius: f32, thetamax: f32 },
    Cylinder [params] { radius: f32, zmin: f32, zmax: f32, thetamax: f32 },
    Hyperboloid [params] { point1: Vec3, point2: Vec3, thetamax: f32 },
    Paraboloid [params] { rmax: f32, zmin: f32, zmax: f32, thetamax: f32 },
    Disk [params] { height: f32, radius: f32, thetamax: f32 },
    Torus [params] { major_radius: f32, minor_radius: f32, phimin: f32, phimax: f32, thetamax: f32 },
    /// The point count is implied by the length of `"P"`.
    Points [params] {},
    Curves [params] { ty: Token, nvertices: Vec<i32>, wrap: Token },
    SubdivisionMesh [params] {
        scheme: Token, nvertices: Vec<i32>, vertices: Vec<i32>, tags: Vec<Token>,
        nargs: Vec<i32>, intargs: Vec<i32>, floatargs: Vec<f32>,
    },
    Blobby [params] { nleaf: i32, code: Vec<i32>, floats: Vec<f32>, strings: Vec<String> },
    Procedural { procedural: Procedural, bound: Bound },
    Geometry [params] { ty: Token },
    ObjectInstance { handle: ObjectHandle },

    // ========================================================================
    // Textures
    // ========================================================================
    MakeTexture [params] {
        picture: String, texture: String, swrap: Token, twrap: Token,
        filter: Token, swidth: f32, twidth: f32,
    },
    MakeBump [params] {
        picture: String, texture: String, swrap: Token, twrap: Token,
        filter: Token, swidth: f32, twidth: f32,
    },
    MakeLatLongEnvironment [params] {
        picture: String, texture: String, filter: Token, swidth: f32, twidth: f32,
    },
    MakeCubeFaceEnvironment [params] {
        px: String, nx: String, py: String, ny: String, pz: String, nz: String,
        texture: String, fov: f32, filter: Token, swidth: f32, twidth: f32,
    },
    MakeShadow [params] { picture: String, texture: String },
}

impl RiCall {
    /// The RIB keyword of the call.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.request().name()
    }
}
