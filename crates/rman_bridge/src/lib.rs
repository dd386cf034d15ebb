//! Application front end of the RMan interface.
//!
//! A [`Bridge`] resolves renderer plugins by name, manages rendering
//! contexts, binds parameter lists and routes every error through the
//! selected [`ErrorHandler`]. Renderers build on [`BaseRenderer`], which
//! keeps the graphics state, records object and archive definitions and
//! expands them for back ends that ask for it.
//!
//! ```rust,ignore
//! use rman_bridge::Bridge;
//! use rman_core::ParamValues;
//!
//! let mut ri = Bridge::new();
//! ri.begin("ribwriter", &[("file", ParamValues::Strings(&["out.rib"]))])?;
//! ri.world_begin()?;
//! ri.sphere(1.0, -1.0, 1.0, 360.0, &[])?;
//! ri.world_end()?;
//! ri.end()?;
//! ```

pub mod backends;
pub mod base;
pub mod binding;
pub mod bridge;
pub mod context;
mod entries;
pub mod handlers;
pub mod manager;
pub mod settings;

pub use base::{Backend, BaseRenderer, Definition, Expand};
pub use bridge::Bridge;
pub use context::{ContextCreator, Handle, RenderContext};
pub use handlers::{AbortHandler, ErrorHandler, ErrorPolicy, IgnoreHandler, PrintHandler};
pub use manager::ContextManager;
pub use settings::{BridgeSettings, SettingsError};
