//! Error Types
//!
//! This module defines the error value that travels across the bridge/backend
//! boundary.
//!
//! # Overview
//!
//! Every failure is an [`RiError`]: an [`ErrorCode`] naming the kind of problem,
//! a [`Severity`], and a human readable message. Errors are never unwound
//! through the interface; they are returned as values, caught by the per-call
//! guard of the bridge and handed to the active error handler.
//!
//! ```rust,ignore
//! use rman_core::errors::{ErrorCode, RiError, Result};
//!
//! fn check_nesting(depth: usize) -> Result<()> {
//!     if depth == 0 {
//!         return Err(RiError::error(ErrorCode::Nesting, "AttributeEnd without AttributeBegin"));
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt;

use thiserror::Error;

/// The kind of an interface error.
///
/// The numeric values are not part of the contract; only the kinds are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // ========================================================================
    // System & I/O
    // ========================================================================
    /// Out of memory.
    NoMem,
    /// Miscellaneous system error.
    System,
    /// File not found.
    NoFile,
    /// Bad file format.
    BadFile,
    /// File or plugin version mismatch.
    Version,
    /// Target disk is full.
    DiskFull,

    // ========================================================================
    // Capability
    // ========================================================================
    /// Optional capability not supported by the back end.
    Incapable,
    /// Unimplemented feature.
    Unimplemented,
    /// Arbitrary program limit exceeded.
    Limit,
    /// Internal inconsistency.
    Bug,

    // ========================================================================
    // State
    // ========================================================================
    /// A call was made before `begin`.
    NotStarted,
    /// Bad begin/end nesting.
    Nesting,
    /// Invalid state for an option call.
    NotOptions,
    /// Invalid state for an attribute call.
    NotAttribs,
    /// Invalid state for a primitive.
    NotPrims,
    /// Other invalid state.
    IllState,
    /// Badly formed motion block.
    BadMotion,
    /// Badly formed solid block.
    BadSolid,

    // ========================================================================
    // Parameters & protocol
    // ========================================================================
    /// Invalid token for the request.
    BadToken,
    /// Parameter out of range.
    Range,
    /// Parameters are inconsistent with each other.
    Consistency,
    /// Bad object, light or context handle.
    BadHandle,
    /// Shader could not be located.
    NoShader,
    /// Required parameters were not provided.
    MissingData,
    /// Declaration syntax error.
    Syntax,

    // ========================================================================
    // Math
    // ========================================================================
    /// Zerodivide, singular matrix, etc.
    Math,
}

impl ErrorCode {
    /// Short identifier in the style of the classic `RIE_` constants.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoMem => "NOMEM",
            Self::System => "SYSTEM",
            Self::NoFile => "NOFILE",
            Self::BadFile => "BADFILE",
            Self::Version => "VERSION",
            Self::DiskFull => "DISKFULL",
            Self::Incapable => "INCAPABLE",
            Self::Unimplemented => "UNIMPLEMENT",
            Self::Limit => "LIMIT",
            Self::Bug => "BUG",
            Self::NotStarted => "NOTSTARTED",
            Self::Nesting => "NESTING",
            Self::NotOptions => "NOTOPTIONS",
            Self::NotAttribs => "NOTATTRIBS",
            Self::NotPrims => "NOTPRIMS",
            Self::IllState => "ILLSTATE",
            Self::BadMotion => "BADMOTION",
            Self::BadSolid => "BADSOLID",
            Self::BadToken => "BADTOKEN",
            Self::Range => "RANGE",
            Self::Consistency => "CONSISTENCY",
            Self::BadHandle => "BADHANDLE",
            Self::NoShader => "NOSHADER",
            Self::MissingData => "MISSINGDATA",
            Self::Syntax => "SYNTAX",
            Self::Math => "MATH",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How serious an error is.
///
/// Ordered so that `Severity::Severe > Severity::Error > ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Rendering stats and other info.
    Info,
    /// Something seems wrong, maybe okay.
    Warning,
    /// Problem. Results may be wrong.
    Error,
    /// So bad you should probably abort.
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Severe => "severe",
        })
    }
}

/// The error value propagated by every fallible interface operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{severity}] {code}: {message}")]
pub struct RiError {
    /// Kind of the error.
    pub code: ErrorCode,
    /// Severity of the error.
    pub severity: Severity,
    /// Description, usually naming the offending request or token.
    pub message: String,
    /// Source line of the offending call, if known.
    pub line: Option<i64>,
}

impl RiError {
    #[must_use]
    pub fn new(code: ErrorCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            line: None,
        }
    }

    #[must_use]
    pub fn info(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Info, message)
    }

    #[must_use]
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    #[must_use]
    pub fn severe(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Severe, message)
    }

    /// Attaches the source line of the call that raised the error.
    #[must_use]
    pub fn at_line(mut self, line: i64) -> Self {
        if line >= 0 {
            self.line = Some(line);
        }
        self
    }

    #[inline]
    #[must_use]
    pub fn is_severe(&self) -> bool {
        self.severity == Severity::Severe
    }
}

impl From<std::io::Error> for RiError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::NoFile,
            std::io::ErrorKind::OutOfMemory => ErrorCode::NoMem,
            std::io::ErrorKind::StorageFull => ErrorCode::DiskFull,
            std::io::ErrorKind::InvalidData => ErrorCode::BadFile,
            _ => ErrorCode::System,
        };
        RiError::error(code, err.to_string())
    }
}

/// Alias for `Result<T, RiError>`.
pub type Result<T> = std::result::Result<T, RiError>;
