//! Error handlers.
//!
//! Every error raised behind an entry point ends up in the bridge's current
//! [`ErrorHandler`]. The handler decides whether the entry point fails
//! ([`AbortHandler`]) or whether processing continues with the next call.

use std::fmt;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use rman_core::{Result, RiError, Severity, tokens};

/// Decides what happens to an error reported by an entry point.
pub trait ErrorHandler: fmt::Debug {
    /// `Err` makes the entry point fail with that error.
    fn handle(&mut self, err: &RiError) -> Result<()>;

    /// The `ErrorHandler` name written to RIB.
    fn name(&self) -> &'static str;
}

/// Raises every error of severity `Error` or worse to the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortHandler;

impl ErrorHandler for AbortHandler {
    fn handle(&mut self, err: &RiError) -> Result<()> {
        log_error(err);
        if err.severity >= Severity::Error {
            return Err(err.clone());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        tokens::ABORT
    }
}

/// Logs the error and continues.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrintHandler;

impl ErrorHandler for PrintHandler {
    fn handle(&mut self, err: &RiError) -> Result<()> {
        log_error(err);
        Ok(())
    }

    fn name(&self) -> &'static str {
        tokens::PRINT
    }
}

/// Drops the error.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreHandler;

impl ErrorHandler for IgnoreHandler {
    fn handle(&mut self, _err: &RiError) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        tokens::IGNORE
    }
}

fn log_error(err: &RiError) {
    match err.severity {
        Severity::Info => info!("{err}"),
        Severity::Warning => warn!("{err}"),
        Severity::Error | Severity::Severe => error!("{err}"),
    }
}

/// The built-in handlers by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    Abort,
    #[default]
    Print,
    Ignore,
}

impl ErrorPolicy {
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            tokens::ABORT => Some(Self::Abort),
            tokens::PRINT => Some(Self::Print),
            tokens::IGNORE => Some(Self::Ignore),
            _ => None,
        }
    }

    #[must_use]
    pub fn handler(self) -> Box<dyn ErrorHandler> {
        match self {
            Self::Abort => Box::new(AbortHandler),
            Self::Print => Box::new(PrintHandler),
            Self::Ignore => Box::new(IgnoreHandler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rman_core::ErrorCode;

    #[test]
    fn abort_raises_errors_only() {
        let mut handler = AbortHandler;
        let warning = RiError::warning(ErrorCode::Range, "clamped");
        assert!(handler.handle(&warning).is_ok());
        let err = RiError::error(ErrorCode::BadToken, "bad");
        assert_eq!(handler.handle(&err), Err(err));
    }

    #[test]
    fn print_and_ignore_continue() {
        let err = RiError::severe(ErrorCode::System, "disk gone");
        assert!(PrintHandler.handle(&err).is_ok());
        assert!(IgnoreHandler.handle(&err).is_ok());
    }

    #[test]
    fn policies_by_name() {
        assert_eq!(ErrorPolicy::parse("abort"), Some(ErrorPolicy::Abort));
        assert_eq!(ErrorPolicy::parse("Abort"), None);
        assert_eq!(ErrorPolicy::Ignore.handler().name(), "ignore");
    }
}
