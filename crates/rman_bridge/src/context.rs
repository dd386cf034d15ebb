//! Rendering contexts and their creators.
//!
//! A [`ContextCreator`] is the plugin a renderer name resolves to. Each
//! `Begin` asks it for a fresh [`RenderContext`], which then receives every
//! interface call of that context until `End`.

use rman_core::{
    ArchiveHandle, LightHandle, ObjectHandle, ParamValues, ParameterList, Result, RiError, Token,
};
use rman_plugin::PluginInterface;
use rman_scene::RiCall;

/// A handle produced by a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    Light(LightHandle),
    Object(ObjectHandle),
    Archive(ArchiveHandle),
}

impl Handle {
    #[must_use]
    pub fn light(self) -> Option<LightHandle> {
        match self {
            Self::Light(h) => Some(h),
            _ => None,
        }
    }

    #[must_use]
    pub fn object(self) -> Option<ObjectHandle> {
        match self {
            Self::Object(h) => Some(h),
            _ => None,
        }
    }

    #[must_use]
    pub fn archive(self) -> Option<ArchiveHandle> {
        match self {
            Self::Archive(h) => Some(h),
            _ => None,
        }
    }
}

/// One live rendering context.
///
/// `request` receives the call with an empty parameter list together with
/// the unbound token/value pairs; binding against the context's own
/// declarations is part of the request.
pub trait RenderContext {
    /// The context became current.
    fn activate(&mut self) {}

    /// Another context became current.
    fn deactivate(&mut self) {}

    /// The context was aborted; no further requests arrive until `end`.
    fn abort(&mut self) {}

    /// Closes the context. Called once, also after `abort`.
    fn end(&mut self) -> Result<()>;

    /// Runs one interface call.
    fn request(
        &mut self,
        call: RiCall,
        tokens: &[Token],
        values: &[ParamValues<'_>],
    ) -> Result<Option<Handle>>;

    /// Out-of-band configuration forwarded by `Control`.
    fn control(&mut self, _name: &str, _params: &ParameterList) -> Result<()> {
        Ok(())
    }

    /// Non-fatal diagnostics collected while the last request ran.
    fn take_deferred(&mut self) -> Vec<RiError> {
        Vec::new()
    }
}

/// Creates the contexts of one renderer.
pub trait ContextCreator {
    /// A new context configured by the parameters of `Begin`.
    fn create(&self, params: &ParameterList) -> Result<Box<dyn RenderContext>>;
}

impl PluginInterface for dyn ContextCreator {
    const TYPE: &'static str = "ContextCreator";
    const MAJOR_VERSION: u64 = 1;
}
