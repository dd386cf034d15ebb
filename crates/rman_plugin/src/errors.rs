//! Plugin loading errors.

use rman_core::{ErrorCode, RiError};
use thiserror::Error;

/// Why a plugin could not be found, loaded or instantiated.
///
/// Every variant names the offending plugin.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    /// The factory returned no instance.
    #[error("Out of memory creating plugin \"{name}\"")]
    OutOfMemory { name: String },

    /// The factory reports another major version than the interface.
    #[error("Plugin \"{name}\" has major version {found}, expected {expected}")]
    VersionMismatch {
        name: String,
        found: u64,
        expected: u64,
    },

    /// The factory reports another plugin type than the interface.
    #[error("Plugin \"{name}\" has type \"{found}\", expected \"{expected}\"")]
    TypeMismatch {
        name: String,
        found: String,
        expected: String,
    },

    /// The library could not be opened or lacks an entry point.
    #[error("Bad plugin file \"{name}\": {reason}")]
    BadFile { name: String, reason: String },

    /// The library was found under a name other than the one it reports.
    #[error("Plugin library \"{name}\" reports the name \"{found}\"")]
    NameMismatch { name: String, found: String },

    /// No factory is registered and no library was found on the search path.
    #[error("Plugin \"{name}\" not found")]
    NotFound { name: String },
}

impl PluginError {
    /// The plugin the error is about.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::OutOfMemory { name }
            | Self::VersionMismatch { name, .. }
            | Self::TypeMismatch { name, .. }
            | Self::BadFile { name, .. }
            | Self::NameMismatch { name, .. }
            | Self::NotFound { name } => name,
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::OutOfMemory { .. } => ErrorCode::NoMem,
            Self::VersionMismatch { .. } | Self::TypeMismatch { .. } => ErrorCode::Version,
            Self::BadFile { .. } | Self::NameMismatch { .. } => ErrorCode::BadFile,
            Self::NotFound { .. } => ErrorCode::NoFile,
        }
    }
}

impl From<PluginError> for RiError {
    fn from(err: PluginError) -> Self {
        RiError::error(err.code(), err.to_string())
    }
}
