//! Attribute state.
//!
//! Everything scoped by `AttributeBegin`/`AttributeEnd`, including the
//! transformation: `TransformBegin`/`TransformEnd` save and restore only the
//! [`TransformState`] held here.

use rustc_hash::FxHashMap;
use smallvec::{SmallVec, smallvec};

use rman_core::{Basis, Bound, ErrorCode, LightHandle, ParameterList, Result, RiError, Token, tokens};

use crate::stack::impl_state_record;
use crate::transform::TransformState;

/// Color or opacity value; three components unless `ColorSamples` says otherwise.
pub type ColorValue = SmallVec<[f32; 3]>;

/// Slots that hold one shader each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderSlot {
    Surface,
    Displacement,
    Atmosphere,
    Interior,
    Exterior,
    Deformation,
}

impl ShaderSlot {
    pub const ALL: [ShaderSlot; 6] = [
        Self::Surface,
        Self::Displacement,
        Self::Atmosphere,
        Self::Interior,
        Self::Exterior,
        Self::Deformation,
    ];

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// A shader name bound with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderBinding {
    pub name: Token,
    pub params: ParameterList,
}

/// Orientation of the current coordinate system relative to surface normals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Outside,
    Inside,
    LeftHanded,
    RightHanded,
}

impl Orientation {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            tokens::OUTSIDE => Self::Outside,
            tokens::INSIDE => Self::Inside,
            tokens::LH => Self::LeftHanded,
            tokens::RH => Self::RightHanded,
            _ => return None,
        })
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outside => tokens::OUTSIDE,
            Self::Inside => tokens::INSIDE,
            Self::LeftHanded => tokens::LH,
            Self::RightHanded => tokens::RH,
        }
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Outside => Self::Inside,
            Self::Inside => Self::Outside,
            Self::LeftHanded => Self::RightHanded,
            Self::RightHanded => Self::LeftHanded,
        }
    }
}

/// Trim curve loops of NURBS surfaces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrimCurve {
    pub ncurves: Vec<i32>,
    pub order: Vec<i32>,
    pub knot: Vec<f32>,
    pub min: Vec<f32>,
    pub max: Vec<f32>,
    pub n: Vec<i32>,
    pub u: Vec<f32>,
    pub v: Vec<f32>,
    pub w: Vec<f32>,
}

impl TrimCurve {
    /// Checks the array sizes against the loop description.
    pub fn validate(&self) -> Result<()> {
        let inconsistent = |what: &str| {
            RiError::error(ErrorCode::Consistency, format!("TrimCurve: {what}"))
        };
        let curves: usize = self.ncurves.iter().map(|&n| n.max(0) as usize).sum();
        if self.order.len() != curves || self.n.len() != curves {
            return Err(inconsistent("order/n counts do not match ncurves"));
        }
        if self.min.len() != curves || self.max.len() != curves {
            return Err(inconsistent("min/max counts do not match ncurves"));
        }
        let knots: usize = self
            .order
            .iter()
            .zip(&self.n)
            .map(|(&o, &n)| (o + n).max(0) as usize)
            .sum();
        if self.knot.len() != knots {
            return Err(inconsistent("knot count does not match order + n"));
        }
        let points: usize = self.n.iter().map(|&n| n.max(0) as usize).sum();
        if self.u.len() != points || self.v.len() != points || self.w.len() != points {
            return Err(inconsistent("u/v/w counts do not match n"));
        }
        Ok(())
    }
}

/// The attribute record.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    pub color: ColorValue,
    pub opacity: ColorValue,
    /// `s1 t1 s2 t2 s3 t3 s4 t4`
    pub texture_coordinates: [f32; 8],
    shaders: [Option<ShaderBinding>; 6],
    /// Light sources switched on or off by `Illuminate`.
    pub illuminated: FxHashMap<LightHandle, bool>,
    pub area_light: Option<LightHandle>,
    pub shading_rate: f32,
    pub shading_interpolation: Token,
    pub matte: bool,
    pub bound: Option<Bound>,
    pub detail: Option<Bound>,
    /// `minvisible lowertransition uppertransition maxvisible`
    pub detail_range: [f32; 4],
    pub geometric_approximation: FxHashMap<Token, f32>,
    pub orientation: Orientation,
    pub sides: u32,
    pub u_basis: Basis,
    pub v_basis: Basis,
    pub trim_curve: Option<TrimCurve>,
    /// Implementation-specific attributes set with `Attribute(name, ...)`.
    pub user: FxHashMap<Token, ParameterList>,
    pub transform: TransformState,
    /// Coordinate systems named by `ScopedCoordinateSystem`.
    pub scoped_coordinate_systems: FxHashMap<Token, TransformState>,
}

impl_state_record!(Attributes, Attributes);

impl Default for Attributes {
    fn default() -> Self {
        Self {
            color: smallvec![1.0, 1.0, 1.0],
            opacity: smallvec![1.0, 1.0, 1.0],
            texture_coordinates: [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            shaders: Default::default(),
            illuminated: FxHashMap::default(),
            area_light: None,
            shading_rate: 1.0,
            shading_interpolation: Token::new(tokens::CONSTANT),
            matte: false,
            bound: None,
            detail: None,
            detail_range: [0.0, 0.0, f32::INFINITY, f32::INFINITY],
            geometric_approximation: FxHashMap::default(),
            orientation: Orientation::Outside,
            sides: 2,
            u_basis: Basis::BEZIER,
            v_basis: Basis::BEZIER,
            trim_curve: None,
            user: FxHashMap::default(),
            transform: TransformState::IDENTITY,
            scoped_coordinate_systems: FxHashMap::default(),
        }
    }
}

impl Attributes {
    /// Sets the color; `values` must have `components` entries.
    pub fn set_color(&mut self, values: &[f32], components: usize) -> Result<()> {
        self.color = checked_color("Color", values, components)?;
        Ok(())
    }

    pub fn set_opacity(&mut self, values: &[f32], components: usize) -> Result<()> {
        self.opacity = checked_color("Opacity", values, components)?;
        Ok(())
    }

    /// Resizes color and opacity after `ColorSamples` changed the component count.
    pub fn resize_colors(&mut self, components: usize) {
        self.color.resize(components, 1.0);
        self.opacity.resize(components, 1.0);
    }

    #[must_use]
    pub fn shader(&self, slot: ShaderSlot) -> Option<&ShaderBinding> {
        self.shaders[slot.index()].as_ref()
    }

    pub fn set_shader(&mut self, slot: ShaderSlot, name: Token, params: ParameterList) {
        self.shaders[slot.index()] = Some(ShaderBinding { name, params });
    }

    pub fn clear_shader(&mut self, slot: ShaderSlot) {
        self.shaders[slot.index()] = None;
    }

    /// Whether `light` illuminates subsequent primitives.
    #[must_use]
    pub fn is_illuminated(&self, light: LightHandle) -> bool {
        self.illuminated.get(&light).copied().unwrap_or(false)
    }

    pub fn set_sides(&mut self, sides: i32) -> Result<()> {
        if sides != 1 && sides != 2 {
            return Err(RiError::error(
                ErrorCode::Range,
                format!("Sides must be 1 or 2, got {sides}"),
            ));
        }
        self.sides = sides as u32;
        Ok(())
    }

    pub fn set_shading_rate(&mut self, rate: f32) -> Result<()> {
        if rate <= 0.0 {
            return Err(RiError::error(
                ErrorCode::Range,
                format!("ShadingRate must be positive, got {rate}"),
            ));
        }
        self.shading_rate = rate;
        Ok(())
    }

    pub fn set_detail_range(&mut self, range: [f32; 4]) -> Result<()> {
        if !(range[0] <= range[1] && range[1] <= range[2] && range[2] <= range[3]) {
            return Err(RiError::error(
                ErrorCode::Range,
                "DetailRange values must be ascending",
            ));
        }
        self.detail_range = range;
        Ok(())
    }

    pub fn set_trim_curve(&mut self, curve: TrimCurve) -> Result<()> {
        curve.validate()?;
        self.trim_curve = Some(curve);
        Ok(())
    }
}

fn checked_color(request: &str, values: &[f32], components: usize) -> Result<ColorValue> {
    if values.len() < components {
        return Err(RiError::error(
            ErrorCode::MissingData,
            format!("{request} needs {components} components, got {}", values.len()),
        ));
    }
    Ok(values[..components].iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{StateRecord, StateStack};

    #[test]
    fn shader_slots_are_independent() {
        let mut attrs = Attributes::default();
        attrs.set_shader(ShaderSlot::Surface, Token::new("plastic"), ParameterList::new());
        attrs.set_shader(ShaderSlot::Displacement, Token::new("bumpy"), ParameterList::new());
        assert_eq!(attrs.shader(ShaderSlot::Surface).unwrap().name, "plastic");
        attrs.clear_shader(ShaderSlot::Surface);
        assert!(attrs.shader(ShaderSlot::Surface).is_none());
        assert_eq!(attrs.shader(ShaderSlot::Displacement).unwrap().name, "bumpy");
    }

    #[test]
    fn push_deep_copies_colors() {
        let mut stack = StateStack::new(Attributes::default());
        stack.push();
        stack.top_mut().set_color(&[0.2, 0.3, 0.4], 3).unwrap();
        stack.pop().unwrap();
        assert_eq!(stack.top().color.as_slice(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn color_needs_enough_components() {
        let mut attrs = Attributes::default();
        assert_eq!(
            attrs.set_color(&[1.0, 0.5], 3).unwrap_err().code,
            ErrorCode::MissingData
        );
        attrs.set_color(&[0.1, 0.2, 0.3, 0.4, 0.5], 5).unwrap();
        assert_eq!(attrs.color.len(), 5);
    }

    #[test]
    fn assign_rejects_other_kinds() {
        let mut attrs = Attributes::default();
        let transform = TransformState::default();
        let err = attrs.assign(&transform).unwrap_err();
        assert_eq!(err.code, ErrorCode::Consistency);

        let mut source = Attributes::default();
        source.matte = true;
        attrs.assign(&source).unwrap();
        assert!(attrs.matte);
    }

    #[test]
    fn orientation_reverses() {
        assert_eq!(Orientation::Outside.reversed(), Orientation::Inside);
        assert_eq!(Orientation::parse("rh").map(Orientation::reversed), Some(Orientation::LeftHanded));
    }

    #[test]
    fn trim_curve_consistency() {
        let good = TrimCurve {
            ncurves: vec![1],
            order: vec![2],
            knot: vec![0.0, 0.0, 1.0, 1.0],
            min: vec![0.0],
            max: vec![1.0],
            n: vec![2],
            u: vec![0.0, 1.0],
            v: vec![0.0, 1.0],
            w: vec![1.0, 1.0],
        };
        assert!(good.validate().is_ok());
        let bad = TrimCurve {
            knot: vec![0.0],
            ..good
        };
        assert_eq!(bad.validate().unwrap_err().code, ErrorCode::Consistency);
    }
}
