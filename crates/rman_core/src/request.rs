//! Interface request catalogue.
//!
//! [`Request`] identifies which interface call a command represents (the
//! "interface index"). The table below is the single source of truth for the
//! RIB keyword and the [`RequestClass`] of every request.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// Broad category of a request, used for block-mode validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestClass {
    /// Context lifecycle handled by the bridge itself.
    Lifecycle,
    /// Begin/End block delimiters.
    Block,
    /// Options, frozen at `WorldBegin`.
    Option,
    /// Attributes, scoped by attribute blocks.
    Attribute,
    /// Modifications of the current transformation.
    Transform,
    /// Geometric primitives.
    Primitive,
    /// Texture-making requests, legal outside of frames.
    Texture,
    /// Everything else (declarations, archives, records).
    Utility,
}

macro_rules! define_requests {
    ( $( $variant:ident => $keyword:literal, $class:ident; )* ) => {
        /// One variant per supported interface call.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Request {
            $( $variant, )*
        }

        impl Request {
            /// Every request, in declaration order.
            pub const ALL: &'static [Request] = &[ $( Request::$variant, )* ];

            /// The RIB keyword of the request, e.g. `"AttributeBegin"`.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $( Request::$variant => $keyword, )*
                }
            }

            #[must_use]
            pub fn class(self) -> RequestClass {
                match self {
                    $( Request::$variant => RequestClass::$class, )*
                }
            }
        }
    };
}

define_requests! {
    Begin => "Begin", Lifecycle;
    End => "End", Lifecycle;
    Context => "Context", Lifecycle;
    ErrorHandler => "ErrorHandler", Lifecycle;
    Control => "Control", Lifecycle;

    FrameBegin => "FrameBegin", Block;
    FrameEnd => "FrameEnd", Block;
    WorldBegin => "WorldBegin", Block;
    WorldEnd => "WorldEnd", Block;
    AttributeBegin => "AttributeBegin", Block;
    AttributeEnd => "AttributeEnd", Block;
    TransformBegin => "TransformBegin", Block;
    TransformEnd => "TransformEnd", Block;
    SolidBegin => "SolidBegin", Block;
    SolidEnd => "SolidEnd", Block;
    ObjectBegin => "ObjectBegin", Block;
    ObjectEnd => "ObjectEnd", Block;
    MotionBegin => "MotionBegin", Block;
    MotionEnd => "MotionEnd", Block;
    ArchiveBegin => "ArchiveBegin", Block;
    ArchiveEnd => "ArchiveEnd", Block;
    ResourceBegin => "ResourceBegin", Block;
    ResourceEnd => "ResourceEnd", Block;

    Declare => "Declare", Utility;
    System => "System", Utility;
    Resource => "Resource", Utility;
    ReadArchive => "ReadArchive", Utility;
    ArchiveRecord => "ArchiveRecord", Utility;

    Format => "Format", Option;
    FrameAspectRatio => "FrameAspectRatio", Option;
    ScreenWindow => "ScreenWindow", Option;
    CropWindow => "CropWindow", Option;
    Projection => "Projection", Option;
    Clipping => "Clipping", Option;
    ClippingPlane => "ClippingPlane", Option;
    DepthOfField => "DepthOfField", Option;
    Shutter => "Shutter", Option;
    PixelVariance => "PixelVariance", Option;
    PixelSamples => "PixelSamples", Option;
    PixelFilter => "PixelFilter", Option;
    Exposure => "Exposure", Option;
    Imager => "Imager", Option;
    Quantize => "Quantize", Option;
    Display => "Display", Option;
    Hider => "Hider", Option;
    ColorSamples => "ColorSamples", Option;
    RelativeDetail => "RelativeDetail", Option;
    Option => "Option", Option;

    Attribute => "Attribute", Attribute;
    Color => "Color", Attribute;
    Opacity => "Opacity", Attribute;
    TextureCoordinates => "TextureCoordinates", Attribute;
    LightSource => "LightSource", Attribute;
    AreaLightSource => "AreaLightSource", Attribute;
    Illuminate => "Illuminate", Attribute;
    Surface => "Surface", Attribute;
    Atmosphere => "Atmosphere", Attribute;
    Interior => "Interior", Attribute;
    Exterior => "Exterior", Attribute;
    Displacement => "Displacement", Attribute;
    Deformation => "Deformation", Attribute;
    ShadingRate => "ShadingRate", Attribute;
    ShadingInterpolation => "ShadingInterpolation", Attribute;
    Matte => "Matte", Attribute;
    Bound => "Bound", Attribute;
    Detail => "Detail", Attribute;
    DetailRange => "DetailRange", Attribute;
    GeometricApproximation => "GeometricApproximation", Attribute;
    Orientation => "Orientation", Attribute;
    ReverseOrientation => "ReverseOrientation", Attribute;
    Sides => "Sides", Attribute;
    Basis => "Basis", Attribute;
    TrimCurve => "TrimCurve", Attribute;

    Identity => "Identity", Transform;
    Transform => "Transform", Transform;
    ConcatTransform => "ConcatTransform", Transform;
    Perspective => "Perspective", Transform;
    Translate => "Translate", Transform;
    Rotate => "Rotate", Transform;
    Scale => "Scale", Transform;
    Skew => "Skew", Transform;
    CoordinateSystem => "CoordinateSystem", Transform;
    ScopedCoordinateSystem => "ScopedCoordinateSystem", Transform;
    CoordSysTransform => "CoordSysTransform", Transform;

    Polygon => "Polygon", Primitive;
    GeneralPolygon => "GeneralPolygon", Primitive;
    PointsPolygons => "PointsPolygons", Primitive;
    PointsGeneralPolygons => "PointsGeneralPolygons", Primitive;
    Patch => "Patch", Primitive;
    PatchMesh => "PatchMesh", Primitive;
    NuPatch => "NuPatch", Primitive;
    Sphere => "Sphere", Primitive;
    Cone => "Cone", Primitive;
    Cylinder => "Cylinder", Primitive;
    Hyperboloid => "Hyperboloid", Primitive;
    Paraboloid => "Paraboloid", Primitive;
    Disk => "Disk", Primitive;
    Torus => "Torus", Primitive;
    Points => "Points", Primitive;
    Curves => "Curves", Primitive;
    SubdivisionMesh => "SubdivisionMesh", Primitive;
    Blobby => "Blobby", Primitive;
    Procedural => "Procedural", Primitive;
    Geometry => "Geometry", Primitive;
    ObjectInstance => "ObjectInstance", Primitive;

    MakeTexture => "MakeTexture", Texture;
    MakeBump => "MakeBump", Texture;
    MakeLatLongEnvironment => "MakeLatLongEnvironment", Texture;
    MakeCubeFaceEnvironment => "MakeCubeFaceEnvironment", Texture;
    MakeShadow => "MakeShadow", Texture;
}

static BY_NAME: Lazy<FxHashMap<&'static str, Request>> =
    Lazy::new(|| Request::ALL.iter().map(|&r| (r.name(), r)).collect());

impl Request {
    /// Looks a request up by its RIB keyword (case-sensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(name).copied()
    }

    /// For a block-opening request, the request that closes the block.
    #[must_use]
    pub fn block_end(self) -> Option<Self> {
        Some(match self {
            Self::FrameBegin => Self::FrameEnd,
            Self::WorldBegin => Self::WorldEnd,
            Self::AttributeBegin => Self::AttributeEnd,
            Self::TransformBegin => Self::TransformEnd,
            Self::SolidBegin => Self::SolidEnd,
            Self::ObjectBegin => Self::ObjectEnd,
            Self::MotionBegin => Self::MotionEnd,
            Self::ArchiveBegin => Self::ArchiveEnd,
            Self::ResourceBegin => Self::ResourceEnd,
            _ => return None,
        })
    }

    #[inline]
    #[must_use]
    pub fn is_block_begin(self) -> bool {
        self.block_end().is_some()
    }

    #[must_use]
    pub fn is_block_end(self) -> bool {
        matches!(
            self,
            Self::FrameEnd
                | Self::WorldEnd
                | Self::AttributeEnd
                | Self::TransformEnd
                | Self::SolidEnd
                | Self::ObjectEnd
                | Self::MotionEnd
                | Self::ArchiveEnd
                | Self::ResourceEnd
        )
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup() {
        for &r in Request::ALL {
            assert_eq!(Request::from_name(r.name()), Some(r));
        }
        assert_eq!(Request::from_name("NotARequest"), None);
    }

    #[test]
    fn every_begin_has_a_matching_end() {
        for &r in Request::ALL {
            if let Some(end) = r.block_end() {
                assert!(end.is_block_end(), "{r} closes with {end}");
            }
        }
    }
}
