//! The `null` back end: validates and tracks state, renders nothing.

use rman_core::{ParameterList, Result};
use rman_scene::RenderCallbacks;

use crate::base::{Backend, BaseRenderer, Expand};
use crate::context::{ContextCreator, RenderContext};

/// Expands instances, archives and procedurals so that every generated call
/// is validated too.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl RenderCallbacks for NullBackend {}

impl Backend for NullBackend {
    fn expand(&self) -> Expand {
        Expand::all()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullCreator;

impl ContextCreator for NullCreator {
    fn create(&self, _params: &ParameterList) -> Result<Box<dyn RenderContext>> {
        Ok(Box::new(BaseRenderer::new(NullBackend)))
    }
}
