//! Current transformation matrix.
//!
//! The interface composes with row vectors: a request concatenates its matrix
//! in front of the CTM (`p' = p * M * CTM`). In glam's column-vector form that
//! is a right multiplication, `ctm = ctm * m`, with the inverse kept in step as
//! `inverse = m⁻¹ * inverse`.

use glam::{Mat3, Mat4, Vec3, Vec4};

use rman_core::{ErrorCode, Result, RiError};

use crate::stack::impl_state_record;

const SINGULAR_EPSILON: f32 = 1e-12;

/// CTM together with its inverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    ctm: Mat4,
    inverse: Mat4,
}

impl Default for TransformState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl_state_record!(TransformState, Transform);

fn checked_inverse(m: &Mat4, what: &str) -> Result<Mat4> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() < SINGULAR_EPSILON {
        return Err(RiError::error(
            ErrorCode::Math,
            format!("{what}: singular matrix"),
        ));
    }
    Ok(m.inverse())
}

impl TransformState {
    pub const IDENTITY: Self = Self {
        ctm: Mat4::IDENTITY,
        inverse: Mat4::IDENTITY,
    };

    #[inline]
    #[must_use]
    pub fn matrix(&self) -> &Mat4 {
        &self.ctm
    }

    #[inline]
    #[must_use]
    pub fn inverse(&self) -> &Mat4 {
        &self.inverse
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.ctm == Mat4::IDENTITY
    }

    pub fn identity(&mut self) {
        *self = Self::IDENTITY;
    }

    /// Replaces the CTM. A singular matrix is rejected and leaves the state unchanged.
    pub fn set(&mut self, m: Mat4) -> Result<()> {
        let inverse = checked_inverse(&m, "Transform")?;
        self.ctm = m;
        self.inverse = inverse;
        Ok(())
    }

    /// Concatenates `m` onto the CTM.
    pub fn concat(&mut self, m: Mat4) -> Result<()> {
        let inverse = checked_inverse(&m, "ConcatTransform")?;
        self.concat_with_inverse(m, inverse);
        Ok(())
    }

    fn concat_with_inverse(&mut self, m: Mat4, inverse: Mat4) {
        self.ctm *= m;
        self.inverse = inverse * self.inverse;
    }

    pub fn translate(&mut self, d: Vec3) {
        self.concat_with_inverse(Mat4::from_translation(d), Mat4::from_translation(-d));
    }

    /// Rotates `angle` degrees about `axis`. A zero axis is a `Math` error.
    pub fn rotate(&mut self, angle: f32, axis: Vec3) -> Result<()> {
        let axis = axis.try_normalize().ok_or_else(|| {
            RiError::error(ErrorCode::Math, "Rotate: zero-length axis")
        })?;
        let m = Mat4::from_axis_angle(axis, angle.to_radians());
        self.concat_with_inverse(m, m.transpose());
        Ok(())
    }

    pub fn scale(&mut self, s: Vec3) -> Result<()> {
        if s.x == 0.0 || s.y == 0.0 || s.z == 0.0 {
            return Err(RiError::error(
                ErrorCode::Math,
                format!("Scale: degenerate factors {s}"),
            ));
        }
        self.concat_with_inverse(Mat4::from_scale(s), Mat4::from_scale(s.recip()));
        Ok(())
    }

    /// Shears so that `d2` is rotated by `angle` degrees towards `d1`.
    pub fn skew(&mut self, angle: f32, d1: Vec3, d2: Vec3) -> Result<()> {
        let m = skew_matrix(angle, d1, d2)?;
        self.concat(m)
    }

    /// Perspective projection with field of view `fov` degrees.
    pub fn perspective(&mut self, fov: f32) -> Result<()> {
        let m = perspective_matrix(fov)?;
        self.concat(m)
    }

    /// Transforms a point from current space to the space the CTM maps into.
    #[must_use]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.ctm.project_point3(p)
    }
}

/// Perspective matrix of the interface, in glam form.
pub fn perspective_matrix(fov: f32) -> Result<Mat4> {
    let half = (fov * 0.5).to_radians();
    if fov <= 0.0 || fov >= 180.0 || half.tan() == 0.0 {
        return Err(RiError::error(
            ErrorCode::Range,
            format!("Perspective: field of view {fov} out of range"),
        ));
    }
    let cot = 1.0 / half.tan();
    // RIB rows [cot 0 0 0] [0 cot 0 0] [0 0 1 1] [0 0 -1 0]; rows become glam columns.
    Ok(Mat4::from_cols(
        Vec4::new(cot, 0.0, 0.0, 0.0),
        Vec4::new(0.0, cot, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 1.0),
        Vec4::new(0.0, 0.0, -1.0, 0.0),
    ))
}

/// Shear matrix of `Skew`.
pub fn skew_matrix(angle: f32, d1: Vec3, d2: Vec3) -> Result<Mat4> {
    let math = |what: &str| RiError::error(ErrorCode::Math, format!("Skew: {what}"));

    let a = d1.try_normalize().ok_or_else(|| math("zero-length direction"))?;
    let d2n = d2.try_normalize().ok_or_else(|| math("zero-length direction"))?;
    let par = a.dot(d2n);
    let b = (d2n - par * a)
        .try_normalize()
        .ok_or_else(|| math("parallel directions"))?;
    let perp = b.dot(d2n);

    let theta = perp.atan2(par) - angle.to_radians();
    if theta <= 0.0 || theta >= std::f32::consts::PI {
        return Err(math("angle exceeds the angle between the directions"));
    }
    let k = 1.0 / theta.tan() - par / perp;

    // p' = p + k (p . b) a
    let shear = Mat3::from_cols(b.x * k * a, b.y * k * a, b.z * k * a);
    Ok(Mat4::from_mat3(Mat3::IDENTITY + shear))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn translate_then_scale_applies_scale_first() {
        let mut t = TransformState::default();
        t.translate(Vec3::new(1.0, 0.0, 0.0));
        t.scale(Vec3::splat(2.0)).unwrap();
        // The last request is applied to points first.
        assert!(approx(t.transform_point(Vec3::X), Vec3::new(3.0, 0.0, 0.0)));
        let back = t.inverse().transform_point3(Vec3::new(3.0, 0.0, 0.0));
        assert!(approx(back, Vec3::X));
    }

    #[test]
    fn rotate_about_z() {
        let mut t = TransformState::default();
        t.rotate(90.0, Vec3::Z).unwrap();
        assert!(approx(t.transform_point(Vec3::X), Vec3::Y));
        assert_eq!(t.rotate(10.0, Vec3::ZERO).unwrap_err().code, ErrorCode::Math);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let mut t = TransformState::default();
        let err = t.set(Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0))).unwrap_err();
        assert_eq!(err.code, ErrorCode::Math);
        assert!(t.is_identity());
    }

    #[test]
    fn skew_shears_along_first_direction() {
        let mut t = TransformState::default();
        // d2 = Y rotated 45 degrees towards d1 = X.
        t.skew(45.0, Vec3::X, Vec3::Y).unwrap();
        assert!(approx(t.transform_point(Vec3::Y), Vec3::new(1.0, 1.0, 0.0)));
        assert!(approx(t.transform_point(Vec3::X), Vec3::X));
    }

    #[test]
    fn perspective_range() {
        assert!(perspective_matrix(90.0).is_ok());
        assert_eq!(perspective_matrix(0.0).unwrap_err().code, ErrorCode::Range);
        let mut t = TransformState::default();
        t.perspective(90.0).unwrap();
        let p = t.transform_point(Vec3::new(1.0, 1.0, 2.0));
        assert!(approx(p, Vec3::new(0.5, 0.5, 0.5)));
    }
}
