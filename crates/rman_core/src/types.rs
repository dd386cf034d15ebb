//! Basic value types shared by every layer.

use std::fmt;

use glam::Mat4;

/// Bounding box `[xmin, xmax, ymin, ymax, zmin, zmax]`.
pub type Bound = [f32; 6];

/// 4x4 matrix in glam's column-vector convention.
///
/// The interface composes row vectors (`p' = p * M`), so each RIB row maps onto
/// one glam column and RIB's sixteen numbers equal `to_cols_array()`.
pub type Matrix = Mat4;

/// Storage class of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageClass {
    /// One value for the whole primitive.
    #[default]
    Constant,
    /// One value per facet/patch.
    Uniform,
    /// One value per corner, interpolated bilinearly.
    Varying,
    /// One value per control vertex, interpolated with the basis.
    Vertex,
    /// One value per face corner, interpolated bilinearly.
    FaceVarying,
    /// One value per face vertex, interpolated with the basis.
    FaceVertex,
}

impl StorageClass {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Uniform => "uniform",
            Self::Varying => "varying",
            Self::Vertex => "vertex",
            Self::FaceVarying => "facevarying",
            Self::FaceVertex => "facevertex",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "constant" => Self::Constant,
            "uniform" => Self::Uniform,
            "varying" => Self::Varying,
            "vertex" => Self::Vertex,
            "facevarying" => Self::FaceVarying,
            "facevertex" => Self::FaceVertex,
            _ => return None,
        })
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data type of a declared parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Float,
    Integer,
    String,
    Color,
    Point,
    Vector,
    Normal,
    Matrix,
    HPoint,
}

/// The primitive element type a [`DataType`] is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicType {
    Float,
    Integer,
    String,
}

impl DataType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Integer => "integer",
            Self::String => "string",
            Self::Color => "color",
            Self::Point => "point",
            Self::Vector => "vector",
            Self::Normal => "normal",
            Self::Matrix => "matrix",
            Self::HPoint => "hpoint",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "float" => Self::Float,
            "integer" | "int" => Self::Integer,
            "string" => Self::String,
            "color" => Self::Color,
            "point" => Self::Point,
            "vector" => Self::Vector,
            "normal" => Self::Normal,
            "matrix" => Self::Matrix,
            "hpoint" => Self::HPoint,
            _ => return None,
        })
    }

    /// Number of basic elements of one value. Colors use `color_components`.
    #[must_use]
    pub fn components(self, color_components: usize) -> usize {
        match self {
            Self::Float | Self::Integer | Self::String => 1,
            Self::Color => color_components,
            Self::Point | Self::Vector | Self::Normal => 3,
            Self::HPoint => 4,
            Self::Matrix => 16,
        }
    }

    #[must_use]
    pub fn basic_type(self) -> BasicType {
        match self {
            Self::Integer => BasicType::Integer,
            Self::String => BasicType::String,
            _ => BasicType::Float,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            /// The handle returned when a call could not create anything.
            pub const ILLEGAL: Self = Self(0);

            #[inline]
            #[must_use]
            pub fn is_valid(self) -> bool {
                self != Self::ILLEGAL
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ILLEGAL
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_handle!(
    /// Handle of a light source, returned by `LightSource`/`AreaLightSource`.
    LightHandle
);
define_handle!(
    /// Handle of a retained object definition, returned by `ObjectBegin`.
    ObjectHandle
);
define_handle!(
    /// Handle of an inline archive, returned by `ArchiveBegin`.
    ArchiveHandle
);
define_handle!(
    /// Handle of a rendering context, returned by `Begin`.
    ContextHandle
);

/// Monotonic allocator for one handle kind. Handles are never reused.
#[derive(Debug, Clone)]
pub struct HandleCounter {
    next: u64,
}

impl HandleCounter {
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next raw handle value.
    pub fn next_raw(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

impl Default for HandleCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Converts a RIB matrix (row-vector convention) into a glam matrix.
#[must_use]
pub fn matrix_from_rows(rows: &[[f32; 4]; 4]) -> Matrix {
    Mat4::from_cols_array_2d(rows)
}

/// Converts a glam matrix back into the rows written in RIB.
#[must_use]
pub fn matrix_to_rows(m: &Matrix) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}
