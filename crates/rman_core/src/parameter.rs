//! Parameter Binding
//!
//! Turns the trailing token/value list of a variadic interface call into a
//! typed, owned [`ParameterList`].
//!
//! # Overview
//!
//! Every token is resolved against a [`DeclarationDictionary`]. The storage
//! class of the declaration selects one of the [`GeometryCounts`] of the
//! primitive, which together with the data type and array length gives the
//! number of basic elements to copy out of the caller's value slice.
//!
//! Binding never stops at the first bad pair: the remaining pairs are still
//! processed and [`ParameterList::set`] reports `false`. The collected
//! diagnostics are available through [`ParameterList::bind_errors`].
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut dict = DeclarationDictionary::with_standard_declarations();
//! let counts = GeometryCounts::polygon(4);
//! let mut list = ParameterList::new();
//! let ok = list.set(
//!     &mut dict,
//!     &counts,
//!     3,
//!     &[Token::new("P")],
//!     &[ParamValues::Floats(&points)],
//! );
//! ```

use rustc_hash::FxHashMap;

use crate::declaration::{Declaration, DeclarationDictionary};
use crate::errors::{ErrorCode, Result, RiError};
use crate::interner::Token;
use crate::types::BasicType;

/// Element counts of one primitive, indexed by storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryCounts {
    /// Values for `vertex` parameters.
    pub vertices: usize,
    /// Values for `varying` parameters.
    pub corners: usize,
    /// Values for `uniform` parameters.
    pub facets: usize,
    /// Values for `facevertex` parameters.
    pub face_vertices: usize,
    /// Values for `facevarying` parameters.
    pub face_corners: usize,
}

impl GeometryCounts {
    /// Counts for calls that are not geometry (shaders, options, attributes).
    pub const CONSTANT: Self = Self {
        vertices: 1,
        corners: 1,
        facets: 1,
        face_vertices: 1,
        face_corners: 1,
    };

    #[must_use]
    pub const fn new(
        vertices: usize,
        corners: usize,
        facets: usize,
        face_vertices: usize,
        face_corners: usize,
    ) -> Self {
        Self {
            vertices,
            corners,
            facets,
            face_vertices,
            face_corners,
        }
    }

    /// Counts of a single polygon with `nverts` vertices.
    #[must_use]
    pub const fn polygon(nverts: usize) -> Self {
        Self::new(nverts, nverts, 1, nverts, nverts)
    }
}

impl Default for GeometryCounts {
    fn default() -> Self {
        Self::CONSTANT
    }
}

/// Borrowed values of one token/value pair, as passed by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValues<'a> {
    Floats(&'a [f32]),
    Ints(&'a [i32]),
    Strings(&'a [&'a str]),
}

impl ParamValues<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Floats(v) => v.len(),
            Self::Ints(v) => v.len(),
            Self::Strings(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn basic_type(&self) -> BasicType {
        match self {
            Self::Floats(_) => BasicType::Float,
            Self::Ints(_) => BasicType::Integer,
            Self::Strings(_) => BasicType::String,
        }
    }
}

impl<'a> From<&'a [f32]> for ParamValues<'a> {
    fn from(v: &'a [f32]) -> Self {
        Self::Floats(v)
    }
}

impl<'a, const N: usize> From<&'a [f32; N]> for ParamValues<'a> {
    fn from(v: &'a [f32; N]) -> Self {
        Self::Floats(v)
    }
}

impl<'a> From<&'a [i32]> for ParamValues<'a> {
    fn from(v: &'a [i32]) -> Self {
        Self::Ints(v)
    }
}

impl<'a, const N: usize> From<&'a [i32; N]> for ParamValues<'a> {
    fn from(v: &'a [i32; N]) -> Self {
        Self::Ints(v)
    }
}

impl<'a> From<&'a [&'a str]> for ParamValues<'a> {
    fn from(v: &'a [&'a str]) -> Self {
        Self::Strings(v)
    }
}

impl<'a, const N: usize> From<&'a [&'a str; N]> for ParamValues<'a> {
    fn from(v: &'a [&'a str; N]) -> Self {
        Self::Strings(v)
    }
}

/// Owned, typed storage of one bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamBuffer {
    Floats(Vec<f32>),
    Ints(Vec<i32>),
    Strings(Vec<String>),
}

impl ParamBuffer {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Floats(v) => v.len(),
            Self::Ints(v) => v.len(),
            Self::Strings(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One bound token/value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Resolved declaration (named or inline).
    pub declaration: Declaration,
    /// The token exactly as the caller passed it.
    pub token: Token,
    /// Ordinal of the pair in the original call.
    pub position: usize,
    pub buffer: ParamBuffer,
}

impl Parameter {
    /// The declared name, without any inline type prefix.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Token {
        self.declaration.name
    }

    #[must_use]
    pub fn floats(&self) -> Option<&[f32]> {
        match &self.buffer {
            ParamBuffer::Floats(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn ints(&self) -> Option<&[i32]> {
        match &self.buffer {
            ParamBuffer::Ints(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn strings(&self) -> Option<&[String]> {
        match &self.buffer {
            ParamBuffer::Strings(v) => Some(v),
            _ => None,
        }
    }
}

/// Insertion-ordered collection of bound parameters.
///
/// Parameters keep the order of the call that bound them; a later pair with
/// an already bound name replaces the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterList {
    params: Vec<Parameter>,
    index: FxHashMap<Token, usize>,
    partial: bool,
    errors: Vec<RiError>,
}

impl ParameterList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a fresh list, discarding previously bound parameters.
    ///
    /// Returns `false` if any pair failed to bind. The remaining pairs are
    /// bound regardless. An empty (null) token ends the list.
    pub fn set(
        &mut self,
        dict: &mut DeclarationDictionary,
        counts: &GeometryCounts,
        color_components: usize,
        tokens: &[Token],
        values: &[ParamValues<'_>],
    ) -> bool {
        self.clear();
        self.add(dict, counts, color_components, tokens, values)
    }

    /// Binds more pairs into the list, replacing parameters of the same name.
    pub fn add(
        &mut self,
        dict: &mut DeclarationDictionary,
        counts: &GeometryCounts,
        color_components: usize,
        tokens: &[Token],
        values: &[ParamValues<'_>],
    ) -> bool {
        let mut ok = true;
        for (position, &token) in tokens.iter().enumerate() {
            if token.is_null() {
                break;
            }
            let Some(value) = values.get(position) else {
                self.fail(RiError::error(
                    ErrorCode::MissingData,
                    format!("no value for parameter \"{token}\""),
                ));
                ok = false;
                continue;
            };
            match Self::bind_one(dict, counts, color_components, token, position, value) {
                Ok(param) => self.insert(param),
                Err(err) => {
                    self.fail(err);
                    ok = false;
                }
            }
        }
        ok
    }

    fn bind_one(
        dict: &mut DeclarationDictionary,
        counts: &GeometryCounts,
        color_components: usize,
        token: Token,
        position: usize,
        value: &ParamValues<'_>,
    ) -> Result<Parameter> {
        let declaration = dict.resolve(token)?;
        let expected = declaration.buffer_len(counts, color_components);

        if declaration.basic_type() != value.basic_type() {
            return Err(RiError::error(
                ErrorCode::Consistency,
                format!(
                    "parameter \"{token}\" declared \"{}\" but got {:?} values",
                    declaration.type_string(),
                    value.basic_type()
                ),
            ));
        }
        if value.len() < expected {
            return Err(RiError::error(
                ErrorCode::MissingData,
                format!(
                    "parameter \"{token}\" needs {expected} values, got {}",
                    value.len()
                ),
            ));
        }

        let buffer = match value {
            ParamValues::Floats(v) => ParamBuffer::Floats(v[..expected].to_vec()),
            ParamValues::Ints(v) => ParamBuffer::Ints(v[..expected].to_vec()),
            ParamValues::Strings(v) => {
                ParamBuffer::Strings(v[..expected].iter().map(|s| (*s).to_owned()).collect())
            }
        };

        Ok(Parameter {
            declaration,
            token,
            position,
            buffer,
        })
    }

    fn fail(&mut self, err: RiError) {
        log::debug!("Parameter binding: {err}");
        self.partial = true;
        self.errors.push(err);
    }

    fn insert(&mut self, param: Parameter) {
        let name = param.name();
        if let Some(&slot) = self.index.get(&name) {
            self.params[slot] = param;
        } else {
            self.index.insert(name, self.params.len());
            self.params.push(param);
        }
    }

    /// Merges already bound parameters into the list, replacing parameters
    /// of the same name in place and appending new ones.
    pub fn merge(&mut self, other: &ParameterList) {
        for param in &other.params {
            self.insert(param.clone());
        }
    }

    /// Drops all parameters and diagnostics.
    pub fn clear(&mut self) {
        self.params.clear();
        self.index.clear();
        self.errors.clear();
        self.partial = false;
    }

    /// Tokens in call order, as the caller spelled them.
    #[must_use]
    pub fn tokens(&self) -> Vec<Token> {
        self.params.iter().map(|p| p.token).collect()
    }

    /// Parameters in call order.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    #[must_use]
    pub fn get(&self, name: Token) -> Option<&Parameter> {
        self.index.get(&name).map(|&i| &self.params[i])
    }

    #[must_use]
    pub fn get_by_str(&self, name: &str) -> Option<&Parameter> {
        Token::get(name).and_then(|t| self.get(t))
    }

    /// First float of `name`, if bound as floats.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        self.get_by_str(name)?.floats()?.first().copied()
    }

    /// First integer of `name`, if bound as integers.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i32> {
        self.get_by_str(name)?.ints()?.first().copied()
    }

    /// First string of `name`, if bound as strings.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        self.get_by_str(name)?
            .strings()?
            .first()
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// `false` after a bind in which at least one pair failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.partial
    }

    /// Diagnostics of failed pairs since the last [`set`](Self::set) or [`clear`](Self::clear).
    #[must_use]
    pub fn bind_errors(&self) -> &[RiError] {
        &self.errors
    }

    /// Takes the first bind diagnostic, if any.
    pub fn take_bind_error(&mut self) -> Option<RiError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.remove(0))
        }
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(names: &[&str]) -> Vec<Token> {
        names.iter().map(|n| Token::new(n)).collect()
    }

    #[test]
    fn binds_points_and_colors() {
        let mut dict = DeclarationDictionary::with_standard_declarations();
        let points = [0.0_f32; 12];
        let colors = [0.5_f32; 12];
        let counts = GeometryCounts::new(4, 4, 1, 4, 4);

        let mut list = ParameterList::new();
        let ok = list.set(
            &mut dict,
            &counts,
            3,
            &tokens(&["P", "Cs"]),
            &[ParamValues::Floats(&points), ParamValues::Floats(&colors)],
        );

        assert!(ok);
        assert_eq!(list.len(), 2);
        assert_eq!(list.get_by_str("P").unwrap().floats().unwrap().len(), 12);
        assert_eq!(list.get_by_str("Cs").unwrap().floats().unwrap().len(), 12);
        assert_eq!(list.tokens(), tokens(&["P", "Cs"]));
    }

    #[test]
    fn merge_accumulates_by_name() {
        let mut dict = DeclarationDictionary::new();
        let counts = GeometryCounts::CONSTANT;
        let mut first = ParameterList::new();
        first.set(
            &mut dict,
            &counts,
            3,
            &tokens(&["uniform float a", "uniform float b"]),
            &[ParamValues::Floats(&[1.0]), ParamValues::Floats(&[2.0])],
        );
        let mut second = ParameterList::new();
        second.set(
            &mut dict,
            &counts,
            3,
            &tokens(&["uniform float b", "uniform float c"]),
            &[ParamValues::Floats(&[5.0]), ParamValues::Floats(&[3.0])],
        );

        first.merge(&second);

        assert_eq!(first.len(), 3);
        assert_eq!(first.float("a"), Some(1.0));
        assert_eq!(first.float("b"), Some(5.0));
        assert_eq!(first.float("c"), Some(3.0));
    }

    #[test]
    fn keeps_call_order() {
        let mut dict = DeclarationDictionary::new();
        for name in ["zeta", "mu", "alpha"] {
            dict.declare(name, "uniform float", false).unwrap();
        }
        let names = tokens(&["zeta", "mu", "alpha"]);
        let values = [
            ParamValues::Floats(&[1.0]),
            ParamValues::Floats(&[2.0]),
            ParamValues::Floats(&[3.0]),
        ];

        let mut list = ParameterList::new();
        assert!(list.set(&mut dict, &GeometryCounts::CONSTANT, 3, &names, &values));
        assert_eq!(list.tokens(), names);
        let positions: Vec<_> = list.params().iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn partial_bind_continues() {
        let mut dict = DeclarationDictionary::with_standard_declarations();
        let mut list = ParameterList::new();
        let ok = list.set(
            &mut dict,
            &GeometryCounts::CONSTANT,
            3,
            &tokens(&["bogus", "Kd"]),
            &[ParamValues::Floats(&[1.0]), ParamValues::Floats(&[0.8])],
        );

        assert!(!ok);
        assert!(!list.is_complete());
        assert_eq!(list.len(), 1);
        assert_eq!(list.float("Kd"), Some(0.8));
        assert_eq!(list.bind_errors()[0].code, ErrorCode::BadToken);
    }

    #[test]
    fn short_values_fail_the_pair() {
        let mut dict = DeclarationDictionary::with_standard_declarations();
        let mut list = ParameterList::new();
        let ok = list.set(
            &mut dict,
            &GeometryCounts::polygon(4),
            3,
            &tokens(&["P"]),
            &[ParamValues::Floats(&[0.0; 9])],
        );
        assert!(!ok);
        assert_eq!(list.bind_errors()[0].code, ErrorCode::MissingData);
    }

    #[test]
    fn add_replaces_in_place() {
        let mut dict = DeclarationDictionary::with_standard_declarations();
        let mut list = ParameterList::new();
        let counts = GeometryCounts::CONSTANT;
        list.set(
            &mut dict,
            &counts,
            3,
            &tokens(&["Kd", "Ks"]),
            &[ParamValues::Floats(&[0.5]), ParamValues::Floats(&[0.1])],
        );
        list.add(
            &mut dict,
            &counts,
            3,
            &tokens(&["Kd", "roughness"]),
            &[ParamValues::Floats(&[0.9]), ParamValues::Floats(&[0.2])],
        );

        assert_eq!(list.tokens(), tokens(&["Kd", "Ks", "roughness"]));
        assert_eq!(list.float("Kd"), Some(0.9));
    }

    #[test]
    fn inline_declarations_and_null_terminator() {
        let mut dict = DeclarationDictionary::new();
        let mut list = ParameterList::new();
        let ok = list.set(
            &mut dict,
            &GeometryCounts::CONSTANT,
            3,
            &[Token::new("uniform string mapname"), Token::null(), Token::new("ignored")],
            &[ParamValues::Strings(&["grid.tex"])],
        );
        assert!(ok);
        assert_eq!(list.len(), 1);
        assert_eq!(list.string("mapname"), Some("grid.tex"));
        assert_eq!(list.params()[0].token.as_str(), "uniform string mapname");
    }

    #[test]
    fn type_mismatch_is_inconsistent() {
        let mut dict = DeclarationDictionary::with_standard_declarations();
        let mut list = ParameterList::new();
        assert!(!list.set(
            &mut dict,
            &GeometryCounts::CONSTANT,
            3,
            &tokens(&["texturename"]),
            &[ParamValues::Floats(&[1.0])],
        ));
        assert_eq!(list.bind_errors()[0].code, ErrorCode::Consistency);
    }
}
