//! Standard spline bases.
//!
//! Process-wide constant tables; the matrices are given in RIB row order and
//! converted with [`matrix_from_rows`](crate::types::matrix_from_rows).

use glam::Mat4;

use crate::tokens;

/// A spline basis together with its step size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub matrix: Mat4,
    pub step: u32,
}

pub const BEZIER_STEP: u32 = 3;
pub const BSPLINE_STEP: u32 = 1;
pub const CATMULLROM_STEP: u32 = 1;
pub const HERMITE_STEP: u32 = 2;
pub const POWER_STEP: u32 = 4;

pub const BEZIER_BASIS: Mat4 = Mat4::from_cols_array(&[
    -1.0, 3.0, -3.0, 1.0, //
    3.0, -6.0, 3.0, 0.0, //
    -3.0, 3.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, 0.0,
]);

pub const BSPLINE_BASIS: Mat4 = Mat4::from_cols_array(&[
    -1.0 / 6.0, 3.0 / 6.0, -3.0 / 6.0, 1.0 / 6.0, //
    3.0 / 6.0, -6.0 / 6.0, 3.0 / 6.0, 0.0, //
    -3.0 / 6.0, 0.0, 3.0 / 6.0, 0.0, //
    1.0 / 6.0, 4.0 / 6.0, 1.0 / 6.0, 0.0,
]);

pub const CATMULLROM_BASIS: Mat4 = Mat4::from_cols_array(&[
    -1.0 / 2.0, 3.0 / 2.0, -3.0 / 2.0, 1.0 / 2.0, //
    2.0 / 2.0, -5.0 / 2.0, 4.0 / 2.0, -1.0 / 2.0, //
    -1.0 / 2.0, 0.0, 1.0 / 2.0, 0.0, //
    0.0, 2.0 / 2.0, 0.0, 0.0,
]);

pub const HERMITE_BASIS: Mat4 = Mat4::from_cols_array(&[
    2.0, 1.0, -2.0, 1.0, //
    -3.0, -2.0, 3.0, -1.0, //
    0.0, 1.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, 0.0,
]);

pub const POWER_BASIS: Mat4 = Mat4::IDENTITY;

impl Basis {
    pub const BEZIER: Basis = Basis { matrix: BEZIER_BASIS, step: BEZIER_STEP };
    pub const BSPLINE: Basis = Basis { matrix: BSPLINE_BASIS, step: BSPLINE_STEP };
    pub const CATMULLROM: Basis = Basis { matrix: CATMULLROM_BASIS, step: CATMULLROM_STEP };
    pub const HERMITE: Basis = Basis { matrix: HERMITE_BASIS, step: HERMITE_STEP };
    pub const POWER: Basis = Basis { matrix: POWER_BASIS, step: POWER_STEP };

    /// Looks up a standard basis by name (`"bezier"`, `"b-spline"`, ...).
    #[must_use]
    pub fn by_name(name: &str) -> Option<Basis> {
        Some(match name {
            tokens::BEZIER => Self::BEZIER,
            tokens::BSPLINE => Self::BSPLINE,
            tokens::CATMULLROM => Self::CATMULLROM,
            tokens::HERMITE => Self::HERMITE,
            tokens::POWER => Self::POWER,
            _ => return None,
        })
    }

    /// The standard name of this basis matrix, if it is one.
    #[must_use]
    pub fn standard_name(matrix: &Mat4) -> Option<&'static str> {
        [
            (tokens::BEZIER, BEZIER_BASIS),
            (tokens::BSPLINE, BSPLINE_BASIS),
            (tokens::CATMULLROM, CATMULLROM_BASIS),
            (tokens::HERMITE, HERMITE_BASIS),
            (tokens::POWER, POWER_BASIS),
        ]
        .into_iter()
        .find(|(_, m)| m == matrix)
        .map(|(name, _)| name)
    }
}

impl Default for Basis {
    fn default() -> Self {
        Self::BEZIER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(Basis::by_name("b-spline"), Some(Basis::BSPLINE));
        assert_eq!(Basis::by_name("hermite").map(|b| b.step), Some(2));
        assert_eq!(Basis::by_name("nurbs"), None);
    }

    #[test]
    fn standard_name_recognises_tables() {
        assert_eq!(Basis::standard_name(&CATMULLROM_BASIS), Some("catmull-rom"));
        assert_eq!(Basis::standard_name(&Mat4::from_diagonal(glam::Vec4::splat(2.0))), None);
    }
}
