//! The interface front end.
//!
//! # Overview
//!
//! A [`Bridge`] is what an application talks to. Every entry point funnels
//! through one guard:
//!
//! 1. a request disabled by `Control "requests"` returns at once,
//! 2. without a current context the call is a `NotStarted` error, unless the
//!    current context is aborted, in which case the call is dropped silently,
//! 3. otherwise the call is bound and executed by the context, and every
//!    diagnostic goes to the current [`ErrorHandler`].
//!
//! Each call has two forms: `sphere_v(.., tokens, values)` takes parallel
//! token and value slices, `sphere(.., &[("Cs", values)])` takes pairs.

use log::{debug, warn};
use rustc_hash::FxHashSet;

use rman_core::{
    ArchiveHandle, ContextHandle, DeclarationDictionary, ErrorCode, GeometryCounts, LightHandle,
    ObjectHandle, ParamValues, ParameterList, Request, Result, RiError, Token,
};
use rman_plugin::{MemoryFactory, PluginFactory, PluginHandler, PluginInfo, SearchPath};
use rman_scene::{RiCall, SceneGraph};

use crate::backends::{self, SceneSlot};
use crate::base::EXTRA_DECLARATIONS;
use crate::context::{ContextCreator, Handle};
use crate::handlers::{ErrorHandler, ErrorPolicy};
use crate::manager::ContextManager;
use crate::settings::BridgeSettings;

/// Parameters understood by the bridge's own `Control` and `Begin` names.
const CONTROL_DECLARATIONS: &[(&str, &str)] = &[
    ("renderer", "uniform string"),
    ("stream", "uniform string"),
    ("disable", "uniform string"),
    ("enable", "uniform string"),
    ("policy", "uniform string"),
    ("ignore", "uniform string"),
];

/// How the guard disposed of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Done(Option<Handle>),
    Failed,
    Dropped,
}

impl Dispatch {
    fn handle(self) -> Option<Handle> {
        match self {
            Self::Done(handle) => handle,
            Self::Failed | Self::Dropped => None,
        }
    }
}

/// Splits name/value pairs into parallel token and value lists.
pub(crate) fn split_params<'a>(
    params: &[(&str, ParamValues<'a>)],
) -> (Vec<Token>, Vec<ParamValues<'a>>) {
    params
        .iter()
        .map(|(name, values)| (Token::new(name), *values))
        .unzip()
}

/// Front end of the interface: renderer plugins, contexts, error policy and
/// the control channel.
pub struct Bridge {
    // Contexts go before the renderer factories that created them.
    contexts: ContextManager,
    renderers: PluginHandler<dyn ContextCreator>,
    stream_path: SearchPath,
    settings: BridgeSettings,
    dictionary: DeclarationDictionary,
    handler: Box<dyn ErrorHandler>,
    last_error: Option<ErrorCode>,
    disabled: FxHashSet<Request>,
    scenes: SceneSlot,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    /// A bridge configured from the default settings and the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(BridgeSettings::default().with_env())
    }

    #[must_use]
    pub fn with_settings(settings: BridgeSettings) -> Self {
        let default_path = SearchPath::default_path();
        let renderer_path = settings
            .renderer_path
            .as_deref()
            .map_or_else(|| default_path.clone(), |spec| SearchPath::parse(spec, &default_path));
        let stream_path = settings
            .stream_path
            .as_deref()
            .map_or_else(|| default_path.clone(), |spec| SearchPath::parse(spec, &default_path));

        let mut renderers = PluginHandler::new(renderer_path);
        let scenes = SceneSlot::new();
        if let Err(err) = backends::register_builtin(&mut renderers, &scenes) {
            warn!("Built-in renderers unavailable: {err}");
        }

        let mut dictionary = DeclarationDictionary::with_standard_declarations();
        for (name, decl) in EXTRA_DECLARATIONS.iter().chain(CONTROL_DECLARATIONS) {
            if let Err(err) = dictionary.declare(name, decl, true) {
                warn!("{err}");
            }
        }

        let disabled = settings
            .disabled_requests
            .iter()
            .filter_map(|name| {
                let request = Request::from_name(name);
                if request.is_none() {
                    warn!("Unknown request \"{name}\" in disabled requests");
                }
                request
            })
            .collect();

        Self {
            contexts: ContextManager::new(),
            renderers,
            stream_path,
            handler: settings.error_policy.handler(),
            settings,
            dictionary,
            last_error: None,
            disabled,
            scenes,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Code of the most recent error reported by any entry point.
    #[must_use]
    pub fn last_error(&self) -> Option<ErrorCode> {
        self.last_error
    }

    #[must_use]
    pub fn error_handler_name(&self) -> &'static str {
        self.handler.name()
    }

    /// Installs `handler` without telling the current context.
    pub fn set_error_handler(&mut self, handler: Box<dyn ErrorHandler>) {
        self.handler = handler;
    }

    #[must_use]
    pub fn renderer_path(&self) -> &SearchPath {
        self.renderers.search_path()
    }

    #[must_use]
    pub fn stream_path(&self) -> &SearchPath {
        &self.stream_path
    }

    #[must_use]
    pub fn is_enabled(&self, request: Request) -> bool {
        !self.disabled.contains(&request)
    }

    /// Registers an in-process renderer under `name`.
    pub fn register_renderer<C, F>(&mut self, name: &str, construct: F) -> Result<()>
    where
        C: ContextCreator + 'static,
        F: Fn() -> C + 'static,
    {
        let factory = MemoryFactory::<dyn ContextCreator>::new(
            PluginInfo::for_interface::<dyn ContextCreator>(name, 0, 0),
            move || Box::new(construct()) as Box<dyn ContextCreator>,
        )?;
        self.register_factory(Box::new(factory))
    }

    pub fn register_factory(&mut self, factory: Box<dyn PluginFactory<dyn ContextCreator>>) -> Result<()> {
        self.renderers.register(factory)?;
        Ok(())
    }

    /// The scene graph of the last `scene` context that ended normally.
    pub fn take_scene(&mut self) -> Option<SceneGraph> {
        self.scenes.take()
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Starts a context on renderer `name` and makes it current. An empty
    /// name selects the configured default renderer.
    ///
    /// A context whose renderer cannot be created is still returned; it is
    /// aborted and only [`end`](Self::end) is meaningful on it.
    pub fn begin_v(
        &mut self,
        name: &str,
        tokens: &[Token],
        values: &[ParamValues<'_>],
    ) -> Result<ContextHandle> {
        let renderer = if name.is_empty() {
            self.settings.renderer.clone()
        } else {
            name.to_owned()
        };
        let params = self.bind_local(tokens, values)?;
        let creator = self
            .renderers
            .last_plugin(&renderer)
            .map_err(RiError::from);
        let (handle, result) = self.contexts.begin(&renderer, creator, &params);
        if let Err(err) = result {
            self.report(err)?;
        }
        Ok(handle)
    }

    pub fn begin(&mut self, name: &str, params: &[(&str, ParamValues<'_>)]) -> Result<ContextHandle> {
        let (tokens, values) = split_params(params);
        self.begin_v(name, &tokens, &values)
    }

    /// Makes `handle` the current context.
    pub fn context(&mut self, handle: ContextHandle) -> Result<()> {
        match self.contexts.switch_to(handle) {
            Ok(()) => Ok(()),
            Err(err) => self.report(err),
        }
    }

    /// The current context, or [`ContextHandle::ILLEGAL`].
    #[must_use]
    pub fn get_context(&self) -> ContextHandle {
        self.contexts.current()
    }

    /// Ends the current context; no context is current afterwards.
    pub fn end(&mut self) -> Result<()> {
        match self.contexts.end() {
            Ok(()) => Ok(()),
            Err(err) => self.report(err),
        }
    }

    /// Aborts the current context. Later calls on it are dropped until `end`.
    pub fn abort(&mut self) {
        self.contexts.abort();
    }

    #[must_use]
    pub fn contexts(&self) -> &ContextManager {
        &self.contexts
    }

    // ------------------------------------------------------------------------
    // Entry points with results
    // ------------------------------------------------------------------------

    /// Declares `name` in the current context. Returns the null token if
    /// the declaration was rejected or no context took it.
    pub fn declare(&mut self, name: &str, declaration: &str) -> Result<Token> {
        let call = RiCall::Declare {
            name: Token::new(name),
            declaration: declaration.to_owned(),
        };
        Ok(match self.forward(call, &[], &[])? {
            Dispatch::Done(_) => Token::new(name),
            Dispatch::Failed | Dispatch::Dropped => Token::null(),
        })
    }

    /// Selects the error policy and records it in the current context.
    pub fn error_handler(&mut self, policy: ErrorPolicy) -> Result<()> {
        self.handler = policy.handler();
        if !self.contexts.valid() {
            return Ok(());
        }
        let call = RiCall::ErrorHandler {
            handler: Token::new(self.handler.name()),
        };
        self.forward(call, &[], &[]).map(|_| ())
    }

    pub fn light_source_v(
        &mut self,
        name: &str,
        tokens: &[Token],
        values: &[ParamValues<'_>],
    ) -> Result<LightHandle> {
        let call = RiCall::LightSource {
            name: Token::new(name),
            handle: LightHandle::ILLEGAL,
            params: ParameterList::new(),
        };
        let handle = self.forward(call, tokens, values)?.handle();
        Ok(handle.and_then(Handle::light).unwrap_or(LightHandle::ILLEGAL))
    }

    pub fn light_source(&mut self, name: &str, params: &[(&str, ParamValues<'_>)]) -> Result<LightHandle> {
        let (tokens, values) = split_params(params);
        self.light_source_v(name, &tokens, &values)
    }

    pub fn area_light_source_v(
        &mut self,
        name: &str,
        tokens: &[Token],
        values: &[ParamValues<'_>],
    ) -> Result<LightHandle> {
        let call = RiCall::AreaLightSource {
            name: Token::new(name),
            handle: LightHandle::ILLEGAL,
            params: ParameterList::new(),
        };
        let handle = self.forward(call, tokens, values)?.handle();
        Ok(handle.and_then(Handle::light).unwrap_or(LightHandle::ILLEGAL))
    }

    pub fn area_light_source(
        &mut self,
        name: &str,
        params: &[(&str, ParamValues<'_>)],
    ) -> Result<LightHandle> {
        let (tokens, values) = split_params(params);
        self.area_light_source_v(name, &tokens, &values)
    }

    /// Opens an object definition; instance it later with the handle.
    pub fn object_begin(&mut self) -> Result<ObjectHandle> {
        let call = RiCall::ObjectBegin {
            handle: ObjectHandle::ILLEGAL,
        };
        let handle = self.forward(call, &[], &[])?.handle();
        Ok(handle.and_then(Handle::object).unwrap_or(ObjectHandle::ILLEGAL))
    }

    pub fn archive_begin_v(
        &mut self,
        name: &str,
        tokens: &[Token],
        values: &[ParamValues<'_>],
    ) -> Result<ArchiveHandle> {
        let call = RiCall::ArchiveBegin {
            name: Token::new(name),
            params: ParameterList::new(),
        };
        let handle = self.forward(call, tokens, values)?.handle();
        Ok(handle.and_then(Handle::archive).unwrap_or(ArchiveHandle::ILLEGAL))
    }

    pub fn archive_begin(
        &mut self,
        name: &str,
        params: &[(&str, ParamValues<'_>)],
    ) -> Result<ArchiveHandle> {
        let (tokens, values) = split_params(params);
        self.archive_begin_v(name, &tokens, &values)
    }

    // ------------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------------

    /// Out-of-band configuration.
    ///
    /// The bridge itself understands:
    ///
    /// - `"searchpath"` with `"renderer"` and `"stream"` path specs,
    /// - `"requests"` with `"disable"` and `"enable"` lists of RIB keywords,
    /// - `"errorhandler"` with a `"policy"` name.
    ///
    /// Every control is also passed to the current context, if any.
    pub fn control_v(&mut self, name: &str, tokens: &[Token], values: &[ParamValues<'_>]) -> Result<()> {
        let params = self.bind_local(tokens, values)?;
        if let Err(err) = self.apply_control(name, &params) {
            return self.report(err);
        }
        let outcome = self
            .contexts
            .backend_mut()
            .map(|backend| backend.control(name, &params));
        match outcome {
            Some(Err(err)) => self.report(err),
            Some(Ok(())) | None => Ok(()),
        }
    }

    pub fn control(&mut self, name: &str, params: &[(&str, ParamValues<'_>)]) -> Result<()> {
        let (tokens, values) = split_params(params);
        self.control_v(name, &tokens, &values)
    }

    fn apply_control(&mut self, name: &str, params: &ParameterList) -> Result<()> {
        match name {
            "searchpath" => {
                if let Some(spec) = params.string("renderer") {
                    let path = SearchPath::parse(spec, self.renderers.search_path());
                    self.renderers.set_search_path(path);
                }
                if let Some(spec) = params.string("stream") {
                    self.stream_path = SearchPath::parse(spec, &self.stream_path);
                    debug!("Stream search path: {}", self.stream_path);
                }
            }
            "requests" => {
                for (key, enable) in [("disable", false), ("enable", true)] {
                    let Some(list) = params.string(key) else {
                        continue;
                    };
                    for keyword in list
                        .split(|c: char| c.is_whitespace() || c == ',')
                        .filter(|s| !s.is_empty())
                    {
                        let request = Request::from_name(keyword).ok_or_else(|| {
                            RiError::error(ErrorCode::BadToken, format!("unknown request \"{keyword}\""))
                        })?;
                        if enable {
                            self.disabled.remove(&request);
                        } else {
                            self.disabled.insert(request);
                        }
                    }
                }
            }
            "errorhandler" => {
                if let Some(policy) = params.string("policy") {
                    let policy = ErrorPolicy::parse(policy).ok_or_else(|| {
                        RiError::error(ErrorCode::BadToken, format!("unknown error handler \"{policy}\""))
                    })?;
                    self.handler = policy.handler();
                }
            }
            _ => {}
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Guard
    // ------------------------------------------------------------------------

    pub(crate) fn forward(
        &mut self,
        call: RiCall,
        tokens: &[Token],
        values: &[ParamValues<'_>],
    ) -> Result<Dispatch> {
        let request = call.request();
        if self.disabled.contains(&request) {
            return Ok(Dispatch::Dropped);
        }

        let outcome = self.contexts.backend_mut().map(|backend| {
            let result = backend.request(call, tokens, values);
            (result, backend.take_deferred())
        });
        match outcome {
            Some((result, deferred)) => {
                let reported = deferred.into_iter().try_for_each(|err| self.report(err));
                match result {
                    // A created handle outranks the handler's verdict on the
                    // diagnostics; they are still reported and recorded.
                    Ok(Some(handle)) => Ok(Dispatch::Done(Some(handle))),
                    Ok(None) => reported.map(|()| Dispatch::Done(None)),
                    Err(err) => {
                        reported?;
                        self.report(err).map(|()| Dispatch::Failed)
                    }
                }
            }
            None if self.contexts.aborted() => Ok(Dispatch::Dropped),
            None => {
                let err = RiError::error(
                    ErrorCode::NotStarted,
                    format!("{} outside of a context", request.name()),
                );
                self.report(err).map(|()| Dispatch::Failed)
            }
        }
    }

    fn report(&mut self, err: RiError) -> Result<()> {
        self.last_error = Some(err.code);
        if err.is_severe() && self.settings.abort_on_severe && self.contexts.valid() {
            warn!("Aborting context {} after: {err}", self.contexts.current());
            self.contexts.abort();
        }
        self.handler.handle(&err)
    }

    fn bind_local(&mut self, tokens: &[Token], values: &[ParamValues<'_>]) -> Result<ParameterList> {
        let mut params = ParameterList::new();
        params.set(&mut self.dictionary, &GeometryCounts::CONSTANT, 3, tokens, values);
        while let Some(err) = params.take_bind_error() {
            self.report(err)?;
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{NULL, RibWriterCreator, SharedBuffer};
    use crate::handlers::IgnoreHandler;

    fn capture() -> (Bridge, SharedBuffer) {
        let mut bridge = Bridge::with_settings(BridgeSettings::default());
        let buffer = SharedBuffer::new();
        let shared = buffer.clone();
        bridge
            .register_renderer("capture", move || RibWriterCreator::with_buffer(shared.clone()))
            .unwrap();
        (bridge, buffer)
    }

    #[test]
    fn calls_without_context_are_not_started() {
        let mut bridge = Bridge::with_settings(BridgeSettings::default());
        bridge.world_begin().unwrap();
        assert_eq!(bridge.last_error(), Some(ErrorCode::NotStarted));
    }

    #[test]
    fn aborted_context_drops_calls_silently() {
        let mut bridge = Bridge::with_settings(BridgeSettings::default());
        bridge.begin(NULL, &[]).unwrap();
        bridge.abort();
        bridge.world_begin().unwrap();
        assert_eq!(bridge.last_error(), None);
        bridge.end().unwrap();
        assert_eq!(bridge.get_context(), ContextHandle::ILLEGAL);
    }

    #[test]
    fn abort_policy_fails_the_entry_point() {
        let mut bridge = Bridge::with_settings(BridgeSettings::default());
        bridge.error_handler(ErrorPolicy::Abort).unwrap();
        let err = bridge.world_end().unwrap_err();
        assert_eq!(err.code, ErrorCode::NotStarted);
    }

    #[test]
    fn unknown_renderer_gives_an_aborted_context() {
        let mut bridge = Bridge::with_settings(BridgeSettings {
            renderer_path: Some("/nonexistent".into()),
            ..BridgeSettings::default()
        });
        bridge.set_error_handler(Box::new(IgnoreHandler));
        let handle = bridge.begin("no-such-renderer", &[]).unwrap();
        assert!(handle.is_valid());
        assert!(bridge.contexts().aborted());
        assert!(bridge.last_error().is_some());
        bridge.sphere(1.0, -1.0, 1.0, 360.0, &[]).unwrap();
        bridge.end().unwrap();
    }

    #[test]
    fn disabled_requests_are_skipped() {
        let (mut bridge, buffer) = capture();
        bridge.begin("capture", &[]).unwrap();
        bridge
            .control("requests", &[("disable", ParamValues::Strings(&["Sphere Color"]))])
            .unwrap();
        assert!(!bridge.is_enabled(Request::Sphere));
        buffer.clear();
        bridge.color(&[1.0, 0.0, 0.0]).unwrap();
        bridge.sphere(1.0, -1.0, 1.0, 360.0, &[]).unwrap();
        bridge.identity().unwrap();
        assert_eq!(buffer.text(), "Identity\n");

        bridge
            .control("requests", &[("enable", ParamValues::Strings(&["Sphere"]))])
            .unwrap();
        assert!(bridge.is_enabled(Request::Sphere));
        assert!(!bridge.is_enabled(Request::Color));
        bridge.end().unwrap();
    }

    #[test]
    fn unknown_request_name_is_bad_token() {
        let (mut bridge, _) = capture();
        bridge
            .control("requests", &[("disable", ParamValues::Strings(&["Teapot"]))])
            .unwrap();
        assert_eq!(bridge.last_error(), Some(ErrorCode::BadToken));
    }

    #[test]
    fn error_handler_control_switches_policy() {
        let (mut bridge, _) = capture();
        bridge
            .control("errorhandler", &[("policy", ParamValues::Strings(&["ignore"]))])
            .unwrap();
        assert_eq!(bridge.error_handler_name(), "ignore");
    }

    #[test]
    fn declare_returns_the_token() {
        let (mut bridge, _) = capture();
        bridge.begin("capture", &[]).unwrap();
        assert_eq!(bridge.declare("roughness", "uniform float").unwrap(), Token::new("roughness"));
        assert!(bridge.declare("broken", "uniform flaot").unwrap().is_null());
        bridge.end().unwrap();
    }

    #[test]
    fn light_handles_are_distinct() {
        let (mut bridge, _) = capture();
        bridge.begin("capture", &[]).unwrap();
        bridge.world_begin().unwrap();
        let a = bridge.light_source("pointlight", &[]).unwrap();
        let b = bridge.light_source("ambientlight", &[]).unwrap();
        assert!(a.is_valid() && b.is_valid());
        assert_ne!(a, b);
        bridge.world_end().unwrap();
        bridge.end().unwrap();
    }
    #[test]
    fn created_handle_survives_rejected_diagnostics() {
        let (mut bridge, _) = capture();
        bridge.begin("capture", &[]).unwrap();
        bridge.world_begin().unwrap();
        bridge.error_handler(ErrorPolicy::Abort).unwrap();
        let light = bridge
            .light_source("pointlight", &[("undeclared", ParamValues::Floats(&[1.0]))])
            .unwrap();
        assert!(light.is_valid());
        assert_eq!(bridge.last_error(), Some(ErrorCode::BadToken));

        // Without a handle the rejection reaches the caller.
        let err = bridge
            .surface("plastic", &[("undeclared", ParamValues::Floats(&[1.0]))])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadToken);
        bridge.end().unwrap();
    }
}

