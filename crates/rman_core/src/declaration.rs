//! Declaration Dictionary
//!
//! Maps parameter names to their semantic type: storage class, data type and
//! array cardinality. Parameter binding consults the dictionary for every
//! token of every variadic call.
//!
//! # Declaration syntax
//!
//! ```text
//! [class] type ['[' n ']'] [name]
//! ```
//!
//! `declare("Kd", "uniform float")` registers a named entry. A parameter token
//! may also carry its own inline declaration, e.g. `"varying float[2] st2"`;
//! such declarations are cached by their full text and never shadow a name.

use rustc_hash::FxHashMap;

use crate::errors::{ErrorCode, Result, RiError};
use crate::interner::Token;
use crate::parameter::GeometryCounts;
use crate::tokens;
use crate::types::{BasicType, DataType, StorageClass};

/// The semantic type of a parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Declaration {
    pub name: Token,
    pub class: StorageClass,
    pub ty: DataType,
    /// Array cardinality, at least 1.
    pub array_len: usize,
    /// Seeded standard declaration that user declarations may shadow.
    pub is_default: bool,
    /// Declared inline inside a parameter token.
    pub is_inline: bool,
}

impl Declaration {
    /// Parses a declaration string.
    ///
    /// `name` is used when the string does not carry a name itself. Returns a
    /// `Syntax` error for malformed strings.
    pub fn parse(name: Option<&str>, decl: &str) -> Result<Self> {
        let spaced = decl.replace('[', " [ ").replace(']', " ] ");
        let mut words = spaced.split_whitespace().peekable();

        let syntax = |what: &str| {
            RiError::error(
                ErrorCode::Syntax,
                format!("malformed declaration \"{decl}\": {what}"),
            )
        };

        let mut class = StorageClass::Uniform;
        let first = words.next().ok_or_else(|| syntax("empty"))?;
        let type_word = if let Some(c) = StorageClass::parse(first) {
            class = c;
            words.next().ok_or_else(|| syntax("missing type"))?
        } else {
            first
        };
        let ty = DataType::parse(type_word)
            .ok_or_else(|| syntax(&format!("unknown type \"{type_word}\"")))?;

        let mut array_len = 1;
        if words.peek() == Some(&"[") {
            words.next();
            let n = words.next().ok_or_else(|| syntax("missing array size"))?;
            array_len = n
                .parse::<usize>()
                .ok()
                .filter(|&n| n >= 1)
                .ok_or_else(|| syntax(&format!("bad array size \"{n}\"")))?;
            if words.next() != Some("]") {
                return Err(syntax("missing ']'"));
            }
        }

        let inline_name = words.next();
        if let Some(extra) = words.next() {
            return Err(syntax(&format!("unexpected \"{extra}\"")));
        }
        let is_inline = inline_name.is_some();
        let name = inline_name
            .or(name)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| syntax("missing name"))?;

        Ok(Self {
            name: Token::new(name),
            class,
            ty,
            array_len,
            is_default: false,
            is_inline,
        })
    }

    /// Number of basic elements (floats, integers or strings) of one value.
    #[inline]
    #[must_use]
    pub fn element_size(&self, color_components: usize) -> usize {
        self.ty.components(color_components).saturating_mul(self.array_len)
    }

    /// Number of values the storage class asks for.
    #[must_use]
    pub fn value_count(&self, counts: &GeometryCounts) -> usize {
        match self.class {
            StorageClass::Constant => 1,
            StorageClass::Uniform => counts.facets,
            StorageClass::Varying => counts.corners,
            StorageClass::Vertex => counts.vertices,
            StorageClass::FaceVarying => counts.face_corners,
            StorageClass::FaceVertex => counts.face_vertices,
        }
    }

    /// Total number of basic elements a bound parameter holds.
    #[must_use]
    pub fn buffer_len(&self, counts: &GeometryCounts, color_components: usize) -> usize {
        self.value_count(counts)
            .saturating_mul(self.element_size(color_components))
    }

    #[inline]
    #[must_use]
    pub fn basic_type(&self) -> BasicType {
        self.ty.basic_type()
    }

    /// Same class, type and cardinality.
    #[must_use]
    pub fn same_type(&self, other: &Declaration) -> bool {
        self.class == other.class && self.ty == other.ty && self.array_len == other.array_len
    }

    /// The declaration string without a name, e.g. `"uniform float[2]"`.
    #[must_use]
    pub fn type_string(&self) -> String {
        if self.array_len > 1 {
            format!("{} {}[{}]", self.class, self.ty, self.array_len)
        } else {
            format!("{} {}", self.class, self.ty)
        }
    }
}

/// Name to declaration map of one rendering context.
#[derive(Debug, Clone, Default)]
pub struct DeclarationDictionary {
    named: FxHashMap<Token, Declaration>,
    inline: FxHashMap<Token, Declaration>,
}

const STANDARD_DECLARATIONS: &[(&str, &str)] = &[
    (tokens::P, "vertex point"),
    (tokens::PZ, "vertex float"),
    (tokens::PW, "vertex hpoint"),
    (tokens::N, "varying normal"),
    (tokens::NP, "uniform normal"),
    (tokens::CS, "varying color"),
    (tokens::OS, "varying color"),
    (tokens::S, "varying float"),
    (tokens::T, "varying float"),
    (tokens::ST, "varying float[2]"),
    (tokens::WIDTH, "varying float"),
    (tokens::CONSTANTWIDTH, "constant float"),
    (tokens::KA, "uniform float"),
    (tokens::KD, "uniform float"),
    (tokens::KS, "uniform float"),
    (tokens::KR, "uniform float"),
    (tokens::ROUGHNESS, "uniform float"),
    (tokens::SPECULARCOLOR, "uniform color"),
    (tokens::TEXTURENAME, "uniform string"),
    (tokens::INTENSITY, "uniform float"),
    (tokens::LIGHTCOLOR, "uniform color"),
    (tokens::FROM, "uniform point"),
    (tokens::TO, "uniform point"),
    (tokens::CONEANGLE, "uniform float"),
    (tokens::CONEDELTAANGLE, "uniform float"),
    (tokens::BEAMDISTRIBUTION, "uniform float"),
    (tokens::AMPLITUDE, "uniform float"),
    (tokens::BACKGROUND, "uniform color"),
    (tokens::DISTANCE, "uniform float"),
    (tokens::MINDISTANCE, "uniform float"),
    (tokens::MAXDISTANCE, "uniform float"),
    (tokens::FOV, "uniform float"),
    (tokens::ORIGIN, "uniform integer[2]"),
    (tokens::NAME, "uniform string"),
];

impl DeclarationDictionary {
    /// An empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A dictionary seeded with the standard parameter names.
    #[must_use]
    pub fn with_standard_declarations() -> Self {
        let mut dict = Self::new();
        for &(name, decl) in STANDARD_DECLARATIONS {
            // The table is static; a parse failure is a programming error.
            if let Err(err) = dict.declare(name, decl, true) {
                log::error!("Bad standard declaration {name}: {err}");
            }
        }
        dict
    }

    /// Registers `name` with the type given by `decl`.
    ///
    /// Redeclaring a user (non-default) name with a different type is a
    /// `BadToken` error; an identical redeclaration is a no-op. Default
    /// entries are silently shadowed.
    pub fn declare(&mut self, name: &str, decl: &str, is_default: bool) -> Result<Declaration> {
        let mut declaration = Declaration::parse(Some(name), decl)?;
        declaration.name = Token::new(name);
        declaration.is_default = is_default;
        declaration.is_inline = false;

        if let Some(existing) = self.named.get(&declaration.name) {
            if existing.same_type(&declaration) && existing.is_default == is_default {
                return Ok(*existing);
            }
            if !existing.is_default && !existing.same_type(&declaration) {
                return Err(RiError::error(
                    ErrorCode::BadToken,
                    format!(
                        "\"{name}\" already declared as \"{}\", cannot redeclare as \"{decl}\"",
                        existing.type_string()
                    ),
                ));
            }
        }

        self.named.insert(declaration.name, declaration);
        Ok(declaration)
    }

    /// Looks up a named declaration.
    #[inline]
    #[must_use]
    pub fn find(&self, name: Token) -> Option<&Declaration> {
        self.named.get(&name)
    }

    /// Resolves a parameter token: a declared name or an inline declaration.
    pub fn resolve(&mut self, token: Token) -> Result<Declaration> {
        if let Some(decl) = self.named.get(&token) {
            return Ok(*decl);
        }
        if let Some(decl) = self.inline.get(&token) {
            return Ok(*decl);
        }

        let text = token.as_str();
        if !text.contains(char::is_whitespace) {
            return Err(RiError::error(
                ErrorCode::BadToken,
                format!("undeclared parameter \"{text}\""),
            ));
        }

        let mut decl = Declaration::parse(None, text)?;
        if !decl.is_inline {
            return Err(RiError::error(
                ErrorCode::Syntax,
                format!("inline declaration \"{text}\" has no name"),
            ));
        }
        decl.is_inline = true;
        self.inline.insert(token, decl);
        Ok(decl)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.named.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }

    /// Iterates the named declarations (in no particular order).
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.named.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_form() {
        let d = Declaration::parse(None, "varying float[2] st2").unwrap();
        assert_eq!(d.name.as_str(), "st2");
        assert_eq!(d.class, StorageClass::Varying);
        assert_eq!(d.ty, DataType::Float);
        assert_eq!(d.array_len, 2);
        assert!(d.is_inline);
    }

    #[test]
    fn parse_defaults_to_uniform() {
        let d = Declaration::parse(Some("Kd"), "float").unwrap();
        assert_eq!(d.class, StorageClass::Uniform);
        assert_eq!(d.name.as_str(), "Kd");
        assert!(!d.is_inline);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(
            Declaration::parse(Some("x"), "uniform quux").unwrap_err().code,
            ErrorCode::Syntax
        );
        assert!(Declaration::parse(Some("x"), "float[0]").is_err());
        assert!(Declaration::parse(Some("x"), "float[2").is_err());
        assert!(Declaration::parse(None, "uniform float").is_err());
    }

    #[test]
    fn redeclaration_rules() {
        let mut dict = DeclarationDictionary::with_standard_declarations();

        // Shadowing a default entry is allowed.
        let kd = dict.declare("Kd", "varying color", false).unwrap();
        assert_eq!(kd.ty, DataType::Color);

        // Identical user redeclaration is a no-op.
        assert!(dict.declare("Kd", "varying color", false).is_ok());

        // Conflicting user redeclaration fails.
        let err = dict.declare("Kd", "uniform string", false).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadToken);
        assert_eq!(dict.find(Token::new("Kd")).unwrap().ty, DataType::Color);
    }

    #[test]
    fn resolve_inline_and_unknown() {
        let mut dict = DeclarationDictionary::with_standard_declarations();
        let inline = dict.resolve(Token::new("uniform color mycolor")).unwrap();
        assert_eq!(inline.name.as_str(), "mycolor");
        // Inline declarations do not become named entries.
        assert!(dict.find(Token::new("mycolor")).is_none());

        let err = dict.resolve(Token::new("nosuchparam")).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadToken);
    }

    #[test]
    fn buffer_len_follows_class() {
        let counts = GeometryCounts {
            vertices: 16,
            corners: 4,
            facets: 1,
            face_vertices: 16,
            face_corners: 4,
        };
        let p = Declaration::parse(Some("P"), "vertex point").unwrap();
        let cs = Declaration::parse(Some("Cs"), "varying color").unwrap();
        let st = Declaration::parse(Some("st"), "varying float[2]").unwrap();
        assert_eq!(p.buffer_len(&counts, 3), 48);
        assert_eq!(cs.buffer_len(&counts, 5), 20);
        assert_eq!(st.buffer_len(&counts, 3), 8);
    }
}
