//! Generated entry points of [`Bridge`].
//!
//! Entries marked `[params]` get a `_v` form taking parallel token and value
//! slices plus a pair-list form; the rest take their arguments only.

use glam::Vec3;

use rman_core::{Basis, Bound, LightHandle, Matrix, ObjectHandle, ParamValues, ParameterList, Result, Token};
use rman_scene::{Procedural, RiCall};
use rman_state::{ColorValue, TrimCurve};

use crate::bridge::{Bridge, split_params};

macro_rules! entry_points {
    (
        $(
            $(#[$meta:meta])*
            $method:ident ( $( $arg:ident : $argty:ty ),* $(,)? ) $( [$params:ident] )?
                => $variant:ident { $( $field:ident $( : $value:expr )? ),* $(,)? };
        )*
    ) => {
        impl Bridge {
            $(
                entry_points!(@entry
                    $(#[$meta])*
                    $method ( $( $arg : $argty ),* ) $( [$params] )?
                    => $variant { $( $field $( : $value )? ),* }
                );
            )*
        }
    };

    (@entry
        $(#[$meta:meta])*
        $method:ident ( $( $arg:ident : $argty:ty ),* ) [params]
        => $variant:ident { $( $field:ident $( : $value:expr )? ),* }
    ) => {
        paste::paste! {
            $(#[$meta])*
            pub fn [<$method _v>](
                &mut self,
                $( $arg: $argty, )*
                tokens: &[Token],
                values: &[ParamValues<'_>],
            ) -> Result<()> {
                let call = RiCall::$variant {
                    $( $field $( : $value )?, )*
                    params: ParameterList::new(),
                };
                self.forward(call, tokens, values).map(|_| ())
            }

            $(#[$meta])*
            pub fn $method(
                &mut self,
                $( $arg: $argty, )*
                params: &[(&str, ParamValues<'_>)],
            ) -> Result<()> {
                let (tokens, values) = split_params(params);
                self.[<$method _v>]($( $arg, )* &tokens, &values)
            }
        }
    };

    (@entry
        $(#[$meta:meta])*
        $method:ident ( $( $arg:ident : $argty:ty ),* )
        => $variant:ident { $( $field:ident $( : $value:expr )? ),* }
    ) => {
        $(#[$meta])*
        pub fn $method(&mut self, $( $arg: $argty ),*) -> Result<()> {
            let call = RiCall::$variant { $( $field $( : $value )? ),* };
            self.forward(call, &[], &[]).map(|_| ())
        }
    };
}

fn tokens_of(names: &[&str]) -> Vec<Token> {
    names.iter().map(|name| Token::new(name)).collect()
}

fn strings_of(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_owned()).collect()
}

entry_points! {
    // ------------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------------
    frame_begin(number: i32) => FrameBegin { number };
    frame_end() => FrameEnd {};
    world_begin() => WorldBegin {};
    world_end() => WorldEnd {};
    attribute_begin() => AttributeBegin {};
    attribute_end() => AttributeEnd {};
    transform_begin() => TransformBegin {};
    transform_end() => TransformEnd {};
    /// `operation` is `"primitive"`, `"union"`, `"intersection"` or `"difference"`.
    solid_begin(operation: &str) => SolidBegin { operation: Token::new(operation) };
    solid_end() => SolidEnd {};
    object_end() => ObjectEnd {};
    motion_begin(times: &[f32]) => MotionBegin { times: times.to_vec() };
    motion_end() => MotionEnd {};
    archive_end() => ArchiveEnd {};
    resource_begin() => ResourceBegin {};
    resource_end() => ResourceEnd {};

    // ------------------------------------------------------------------------
    // Utility
    // ------------------------------------------------------------------------
    system(command: &str) => System { command: command.to_owned() };
    resource(name: &str, ty: &str) [params] => Resource { name: Token::new(name), ty: Token::new(ty) };
    read_archive(name: &str) [params] => ReadArchive { name: Token::new(name) };
    archive_record(ty: &str, line: &str) => ArchiveRecord { ty: Token::new(ty), line: line.to_owned() };

    // ------------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------------
    format(x_resolution: i32, y_resolution: i32, pixel_aspect: f32)
        => Format { x_resolution, y_resolution, pixel_aspect };
    frame_aspect_ratio(ratio: f32) => FrameAspectRatio { ratio };
    screen_window(left: f32, right: f32, bottom: f32, top: f32)
        => ScreenWindow { left, right, bottom, top };
    crop_window(xmin: f32, xmax: f32, ymin: f32, ymax: f32) => CropWindow { xmin, xmax, ymin, ymax };
    projection(name: &str) [params] => Projection { name: Token::new(name) };
    clipping(near: f32, far: f32) => Clipping { near, far };
    clipping_plane(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32)
        => ClippingPlane { x, y, z, nx, ny, nz };
    depth_of_field(fstop: f32, focal_length: f32, focal_distance: f32)
        => DepthOfField { fstop, focal_length, focal_distance };
    shutter(open: f32, close: f32) => Shutter { open, close };
    pixel_variance(variance: f32) => PixelVariance { variance };
    pixel_samples(xsamples: f32, ysamples: f32) => PixelSamples { xsamples, ysamples };
    pixel_filter(filter: &str, xwidth: f32, ywidth: f32)
        => PixelFilter { filter: Token::new(filter), xwidth, ywidth };
    exposure(gain: f32, gamma: f32) => Exposure { gain, gamma };
    imager(name: &str) [params] => Imager { name: Token::new(name) };
    quantize(ty: &str, one: i32, min: i32, max: i32, dither_amplitude: f32)
        => Quantize { ty: Token::new(ty), one, min, max, dither_amplitude };
    display(name: &str, ty: &str, mode: &str) [params]
        => Display { name: name.to_owned(), ty: Token::new(ty), mode: Token::new(mode) };
    hider(ty: &str) [params] => Hider { ty: Token::new(ty) };
    /// Both matrices hold `n * 3` values for `n` color components.
    color_samples(n_rgb: &[f32], rgb_n: &[f32])
        => ColorSamples { n_rgb: n_rgb.to_vec(), rgb_n: rgb_n.to_vec() };
    relative_detail(relative_detail: f32) => RelativeDetail { relative_detail };
    option(name: &str) [params] => Option { name: Token::new(name) };

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------
    attribute(name: &str) [params] => Attribute { name: Token::new(name) };
    color(color: &[f32]) => Color { color: ColorValue::from_slice(color) };
    opacity(opacity: &[f32]) => Opacity { opacity: ColorValue::from_slice(opacity) };
    texture_coordinates(s1: f32, t1: f32, s2: f32, t2: f32, s3: f32, t3: f32, s4: f32, t4: f32)
        => TextureCoordinates { s1, t1, s2, t2, s3, t3, s4, t4 };
    illuminate(light: LightHandle, on: bool) => Illuminate { light, on };
    surface(name: &str) [params] => Surface { name: Token::new(name) };
    atmosphere(name: &str) [params] => Atmosphere { name: Token::new(name) };
    interior(name: &str) [params] => Interior { name: Token::new(name) };
    exterior(name: &str) [params] => Exterior { name: Token::new(name) };
    displacement(name: &str) [params] => Displacement { name: Token::new(name) };
    deformation(name: &str) [params] => Deformation { name: Token::new(name) };
    shading_rate(size: f32) => ShadingRate { size };
    shading_interpolation(ty: &str) => ShadingInterpolation { ty: Token::new(ty) };
    matte(on: bool) => Matte { on };
    bound(bound: Bound) => Bound { bound };
    detail(bound: Bound) => Detail { bound };
    detail_range(min_visible: f32, lower_transition: f32, upper_transition: f32, max_visible: f32)
        => DetailRange { min_visible, lower_transition, upper_transition, max_visible };
    geometric_approximation(ty: &str, value: f32)
        => GeometricApproximation { ty: Token::new(ty), value };
    orientation(orientation: &str) => Orientation { orientation: Token::new(orientation) };
    reverse_orientation() => ReverseOrientation {};
    sides(sides: i32) => Sides { sides };
    basis(u_basis: Basis, v_basis: Basis) => Basis { u_basis, v_basis };
    trim_curve(curve: TrimCurve) => TrimCurve { curve };

    // ------------------------------------------------------------------------
    // Transformations
    // ------------------------------------------------------------------------
    identity() => Identity {};
    transform(matrix: Matrix) => Transform { matrix };
    concat_transform(matrix: Matrix) => ConcatTransform { matrix };
    perspective(fov: f32) => Perspective { fov };
    translate(dx: f32, dy: f32, dz: f32) => Translate { dx, dy, dz };
    rotate(angle: f32, dx: f32, dy: f32, dz: f32) => Rotate { angle, dx, dy, dz };
    scale(sx: f32, sy: f32, sz: f32) => Scale { sx, sy, sz };
    skew(angle: f32, dx1: f32, dy1: f32, dz1: f32, dx2: f32, dy2: f32, dz2: f32)
        => Skew { angle, dx1, dy1, dz1, dx2, dy2, dz2 };
    coordinate_system(space: &str) => CoordinateSystem { space: Token::new(space) };
    scoped_coordinate_system(space: &str) => ScopedCoordinateSystem { space: Token::new(space) };
    coord_sys_transform(space: &str) => CoordSysTransform { space: Token::new(space) };

    // ------------------------------------------------------------------------
    // Geometric primitives
    // ------------------------------------------------------------------------
    polygon() [params] => Polygon {};
    general_polygon(nverts: &[i32]) [params] => GeneralPolygon { nverts: nverts.to_vec() };
    points_polygons(nverts: &[i32], verts: &[i32]) [params]
        => PointsPolygons { nverts: nverts.to_vec(), verts: verts.to_vec() };
    points_general_polygons(nloops: &[i32], nverts: &[i32], verts: &[i32]) [params]
        => PointsGeneralPolygons {
            nloops: nloops.to_vec(),
            nverts: nverts.to_vec(),
            verts: verts.to_vec(),
        };
    patch(ty: &str) [params] => Patch { ty: Token::new(ty) };
    patch_mesh(ty: &str, nu: i32, uwrap: &str, nv: i32, vwrap: &str) [params]
        => PatchMesh {
            ty: Token::new(ty),
            nu,
            uwrap: Token::new(uwrap),
            nv,
            vwrap: Token::new(vwrap),
        };
    nu_patch(
        nu: i32, uorder: i32, uknot: &[f32], umin: f32, umax: f32,
        nv: i32, vorder: i32, vknot: &[f32], vmin: f32, vmax: f32,
    ) [params]
        => NuPatch {
            nu, uorder, uknot: uknot.to_vec(), umin, umax,
            nv, vorder, vknot: vknot.to_vec(), vmin, vmax,
        };
    sphere(radius: f32, zmin: f32, zmax: f32, thetamax: f32) [params]
        => Sphere { radius, zmin, zmax, thetamax };
    cone(height: f32, radius: f32, thetamax: f32) [params] => Cone { height, radius, thetamax };
    cylinder(radius: f32, zmin: f32, zmax: f32, thetamax: f32) [params]
        => Cylinder { radius, zmin, zmax, thetamax };
    hyperboloid(point1: Vec3, point2: Vec3, thetamax: f32) [params]
        => Hyperboloid { point1, point2, thetamax };
    paraboloid(rmax: f32, zmin: f32, zmax: f32, thetamax: f32) [params]
        => Paraboloid { rmax, zmin, zmax, thetamax };
    disk(height: f32, radius: f32, thetamax: f32) [params] => Disk { height, radius, thetamax };
    torus(major_radius: f32, minor_radius: f32, phimin: f32, phimax: f32, thetamax: f32) [params]
        => Torus { major_radius, minor_radius, phimin, phimax, thetamax };
    points() [params] => Points {};
    curves(ty: &str, nvertices: &[i32], wrap: &str) [params]
        => Curves { ty: Token::new(ty), nvertices: nvertices.to_vec(), wrap: Token::new(wrap) };
    subdivision_mesh(
        scheme: &str, nvertices: &[i32], vertices: &[i32], tags: &[&str],
        nargs: &[i32], intargs: &[i32], floatargs: &[f32],
    ) [params]
        => SubdivisionMesh {
            scheme: Token::new(scheme),
            nvertices: nvertices.to_vec(),
            vertices: vertices.to_vec(),
            tags: tokens_of(tags),
            nargs: nargs.to_vec(),
            intargs: intargs.to_vec(),
            floatargs: floatargs.to_vec(),
        };
    blobby(nleaf: i32, code: &[i32], floats: &[f32], strings: &[&str]) [params]
        => Blobby { nleaf, code: code.to_vec(), floats: floats.to_vec(), strings: strings_of(strings) };
    procedural(procedural: Procedural, bound: Bound) => Procedural { procedural, bound };
    geometry(ty: &str) [params] => Geometry { ty: Token::new(ty) };
    object_instance(handle: ObjectHandle) => ObjectInstance { handle };

    // ------------------------------------------------------------------------
    // Textures
    // ------------------------------------------------------------------------
    make_texture(
        picture: &str, texture: &str, swrap: &str, twrap: &str,
        filter: &str, swidth: f32, twidth: f32,
    ) [params]
        => MakeTexture {
            picture: picture.to_owned(), texture: texture.to_owned(),
            swrap: Token::new(swrap), twrap: Token::new(twrap),
            filter: Token::new(filter), swidth, twidth,
        };
    make_bump(
        picture: &str, texture: &str, swrap: &str, twrap: &str,
        filter: &str, swidth: f32, twidth: f32,
    ) [params]
        => MakeBump {
            picture: picture.to_owned(), texture: texture.to_owned(),
            swrap: Token::new(swrap), twrap: Token::new(twrap),
            filter: Token::new(filter), swidth, twidth,
        };
    make_lat_long_environment(picture: &str, texture: &str, filter: &str, swidth: f32, twidth: f32) [params]
        => MakeLatLongEnvironment {
            picture: picture.to_owned(), texture: texture.to_owned(),
            filter: Token::new(filter), swidth, twidth,
        };
    make_cube_face_environment(
        px: &str, nx: &str, py: &str, ny: &str, pz: &str, nz: &str,
        texture: &str, fov: f32, filter: &str, swidth: f32, twidth: f32,
    ) [params]
        => MakeCubeFaceEnvironment {
            px: px.to_owned(), nx: nx.to_owned(), py: py.to_owned(),
            ny: ny.to_owned(), pz: pz.to_owned(), nz: nz.to_owned(),
            texture: texture.to_owned(), fov, filter: Token::new(filter), swidth, twidth,
        };
    make_shadow(picture: &str, texture: &str) [params]
        => MakeShadow { picture: picture.to_owned(), texture: texture.to_owned() };
}
