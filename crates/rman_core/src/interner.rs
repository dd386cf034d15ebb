//! Global Token Interner
//!
//! Atomizes strings into compact [`Token`] values. Two tokens created from the
//! same text are always equal, and comparing or hashing tokens is an integer
//! operation.

use std::fmt;

use lasso::{Spur, ThreadedRodeo};
use once_cell::sync::Lazy;

static INTERNER: Lazy<ThreadedRodeo> = Lazy::new(ThreadedRodeo::new);

/// An interned identifier.
///
/// Used for declared parameter names, shader names, enumerated constants such
/// as `"bilinear"` or `"periodic"` and every other atomized string of the
/// interface.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(Spur);

impl Token {
    /// Interns `s`, returning the existing token if it was seen before.
    #[inline]
    #[must_use]
    pub fn new(s: &str) -> Self {
        Self(INTERNER.get_or_intern(s))
    }

    /// Looks up an already interned string without allocating.
    #[inline]
    #[must_use]
    pub fn get(s: &str) -> Option<Self> {
        INTERNER.get(s).map(Self)
    }

    /// Resolves the token back to its text.
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        INTERNER.resolve(&self.0)
    }

    /// The empty token, which plays the role of `RI_NULL` in token lists.
    #[inline]
    #[must_use]
    pub fn null() -> Self {
        Self::new("")
    }

    #[inline]
    #[must_use]
    pub fn is_null(self) -> bool {
        self.as_str().is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?})", self.as_str())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<&String> for Token {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Pre-interns the standard token names so that hot paths only hit lookups.
pub fn preload_standard_tokens() {
    for name in crate::tokens::STANDARD_TOKENS {
        let _ = Token::new(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_token() {
        let a = Token::new("plastic");
        let b = Token::new("plastic");
        let c = Token::new("matte");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "plastic");
    }

    #[test]
    fn get_does_not_intern() {
        let _ = Token::new("existing-token");
        assert!(Token::get("existing-token").is_some());
        assert!(Token::get("never-interned-token-xyz").is_none());
    }

    #[test]
    fn null_token_is_empty() {
        assert!(Token::null().is_null());
        assert!(!Token::new("P").is_null());
    }
}
