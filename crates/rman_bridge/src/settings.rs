//! Bridge configuration.
//!
//! [`BridgeSettings`] is plain data: it can be built in code, read from
//! JSON and overridden from the environment:
//!
//! | variable             | field            |
//! |----------------------|------------------|
//! | `RMAN_RENDERER`      | `renderer`       |
//! | `RMAN_RENDERER_PATH` | `renderer_path`  |
//! | `RMAN_STREAM_PATH`   | `stream_path`    |

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rman_core::{ErrorCode, RiError};

use crate::handlers::ErrorPolicy;

pub const ENV_RENDERER: &str = "RMAN_RENDERER";
pub const ENV_RENDERER_PATH: &str = "RMAN_RENDERER_PATH";
pub const ENV_STREAM_PATH: &str = "RMAN_STREAM_PATH";

/// Renderer used by `Begin` without a name.
pub const DEFAULT_RENDERER: &str = "ribwriter";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<SettingsError> for RiError {
    fn from(err: SettingsError) -> Self {
        let code = match err {
            SettingsError::Io(_) => ErrorCode::NoFile,
            SettingsError::Json(_) => ErrorCode::BadFile,
        };
        RiError::error(code, err.to_string())
    }
}

/// Configuration of a [`Bridge`](crate::Bridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Renderer plugin used by `Begin` without a name.
    pub renderer: String,
    /// Search path for renderer libraries; `None` keeps the default path.
    pub renderer_path: Option<String>,
    /// Search path for stream handler libraries.
    pub stream_path: Option<String>,
    pub error_policy: ErrorPolicy,
    /// Abort the current context on severe errors.
    pub abort_on_severe: bool,
    /// RIB keywords of entry points that are ignored.
    pub disabled_requests: Vec<String>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            renderer: DEFAULT_RENDERER.to_owned(),
            renderer_path: None,
            stream_path: None,
            error_policy: ErrorPolicy::default(),
            abort_on_severe: true,
            disabled_requests: Vec::new(),
        }
    }
}

impl BridgeSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Applies the `RMAN_*` variables of the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    /// Applies the `RMAN_*` variables as reported by `lookup`.
    #[must_use]
    pub fn with_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(renderer) = lookup(ENV_RENDERER).filter(|r| !r.is_empty()) {
            self.renderer = renderer;
        }
        if let Some(path) = lookup(ENV_RENDERER_PATH) {
            self.renderer_path = Some(path);
        }
        if let Some(path) = lookup(ENV_STREAM_PATH) {
            self.stream_path = Some(path);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            BridgeSettings::from_json(r#"{ "error_policy": "ignore", "disabled_requests": ["Sphere"] }"#)
                .unwrap();
        assert_eq!(settings.error_policy, ErrorPolicy::Ignore);
        assert_eq!(settings.disabled_requests, ["Sphere"]);
        assert_eq!(settings.renderer, DEFAULT_RENDERER);
        assert!(settings.abort_on_severe);
    }

    #[test]
    fn json_survives_a_round_trip() {
        let settings = BridgeSettings {
            renderer: "null".into(),
            renderer_path: Some("/opt/rman:&".into()),
            ..BridgeSettings::default()
        };
        let text = settings.to_json().unwrap();
        assert_eq!(BridgeSettings::from_json(&text).unwrap(), settings);
    }

    #[test]
    fn environment_overrides() {
        let settings = BridgeSettings::default().with_env_from(|name| match name {
            ENV_RENDERER => Some("null".into()),
            ENV_STREAM_PATH => Some("/streams".into()),
            _ => None,
        });
        assert_eq!(settings.renderer, "null");
        assert_eq!(settings.stream_path.as_deref(), Some("/streams"));
        assert_eq!(settings.renderer_path, None);
    }

    #[test]
    fn malformed_json_is_bad_file() {
        let err: RiError = BridgeSettings::from_json("{").unwrap_err().into();
        assert_eq!(err.code, ErrorCode::BadFile);
    }
}
