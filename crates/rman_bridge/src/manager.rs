//! Context bookkeeping.
//!
//! # Overview
//!
//! [`ContextManager`] owns every live context of a bridge and tracks which
//! one is current. A context is either:
//!
//! - **valid**: its back end was created and it has not been aborted,
//! - **aborted**: `abort` was called, or creating the back end failed.
//!
//! Aborted contexts stay registered until `end`, which is always safe to
//! call.

use std::collections::BTreeMap;

use log::{debug, warn};

use rman_core::{ContextHandle, ErrorCode, HandleCounter, ParameterList, Result, RiError};
use rman_plugin::PluginRef;

use crate::context::{ContextCreator, RenderContext};

// Field order is drop order: the back end goes before its creator.
struct ContextEntry {
    backend: Option<Box<dyn RenderContext>>,
    _creator: Option<PluginRef<dyn ContextCreator>>,
    renderer: String,
    aborted: bool,
}

impl ContextEntry {
    fn is_valid(&self) -> bool {
        self.backend.is_some() && !self.aborted
    }
}

/// The live contexts of one bridge.
pub struct ContextManager {
    contexts: BTreeMap<ContextHandle, ContextEntry>,
    current: Option<ContextHandle>,
    handles: HandleCounter,
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            contexts: BTreeMap::new(),
            current: None,
            handles: HandleCounter::new(),
        }
    }

    /// Creates a context with `creator` and makes it current.
    ///
    /// The handle is registered even if creation fails; the context is then
    /// aborted and only `end` cleans it up.
    pub fn begin(
        &mut self,
        renderer: &str,
        creator: Result<PluginRef<dyn ContextCreator>>,
        params: &ParameterList,
    ) -> (ContextHandle, Result<()>) {
        self.deactivate_current();

        let handle = ContextHandle(self.handles.next_raw());
        let (creator, created) = match creator {
            Ok(creator) => {
                let created = creator.create(params);
                (Some(creator), created)
            }
            Err(err) => (None, Err(err)),
        };

        let (backend, result) = match created {
            Ok(mut backend) => {
                backend.activate();
                debug!("Context {handle} begins on renderer \"{renderer}\"");
                (Some(backend), Ok(()))
            }
            Err(err) => {
                warn!("Context {handle} on renderer \"{renderer}\" failed: {err}");
                (None, Err(err))
            }
        };

        self.contexts.insert(
            handle,
            ContextEntry {
                renderer: renderer.to_owned(),
                _creator: creator,
                aborted: backend.is_none(),
                backend,
            },
        );
        self.current = Some(handle);
        (handle, result)
    }

    /// Makes `handle` current. An unknown handle leaves no context current.
    pub fn switch_to(&mut self, handle: ContextHandle) -> Result<()> {
        if self.current == Some(handle) {
            return Ok(());
        }
        self.deactivate_current();
        let Some(entry) = self.contexts.get_mut(&handle) else {
            self.current = None;
            return Err(RiError::error(
                ErrorCode::BadHandle,
                format!("unknown context handle {handle}"),
            ));
        };
        if entry.is_valid() {
            if let Some(backend) = entry.backend.as_mut() {
                backend.activate();
            }
        }
        self.current = Some(handle);
        Ok(())
    }

    /// Ends and forgets the current context.
    pub fn end(&mut self) -> Result<()> {
        let Some(handle) = self.current.take() else {
            return Err(RiError::error(
                ErrorCode::NotStarted,
                "End without an active context",
            ));
        };
        let Some(mut entry) = self.contexts.remove(&handle) else {
            return Ok(());
        };
        debug!("Context {handle} on renderer \"{}\" ends", entry.renderer);
        match entry.backend.as_mut() {
            Some(backend) => backend.end(),
            None => Ok(()),
        }
    }

    /// Aborts the current context; it stays current until `end`.
    pub fn abort(&mut self) {
        let Some(entry) = self.current.and_then(|h| self.contexts.get_mut(&h)) else {
            return;
        };
        if entry.aborted {
            return;
        }
        entry.aborted = true;
        if let Some(backend) = entry.backend.as_mut() {
            backend.abort();
        }
    }

    /// The current context, [`ContextHandle::ILLEGAL`] if none.
    #[must_use]
    pub fn current(&self) -> ContextHandle {
        self.current.unwrap_or(ContextHandle::ILLEGAL)
    }

    /// Whether a current context accepts calls.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.current_entry().is_some_and(ContextEntry::is_valid)
    }

    /// Whether the current context was aborted.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.current_entry().is_some_and(|entry| entry.aborted)
    }

    #[must_use]
    pub fn renderer(&self) -> Option<&str> {
        self.current_entry().map(|entry| entry.renderer.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// The back end of the current context if it is valid.
    pub fn backend_mut(&mut self) -> Option<&mut (dyn RenderContext + 'static)> {
        let entry = self.contexts.get_mut(&self.current?)?;
        if entry.aborted {
            return None;
        }
        entry.backend.as_deref_mut()
    }

    fn current_entry(&self) -> Option<&ContextEntry> {
        self.contexts.get(&self.current?)
    }

    fn deactivate_current(&mut self) {
        if let Some(entry) = self.current.and_then(|h| self.contexts.get_mut(&h)) {
            if entry.is_valid() {
                if let Some(backend) = entry.backend.as_mut() {
                    backend.deactivate();
                }
            }
        }
    }
}

impl Drop for ContextManager {
    fn drop(&mut self) {
        // contexts before the creators and libraries behind them
        for (handle, mut entry) in std::mem::take(&mut self.contexts) {
            if let Some(backend) = entry.backend.as_mut() {
                if let Err(err) = backend.end() {
                    warn!("Context {handle} did not end cleanly: {err}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rman_core::{ParamValues, Token};
    use rman_plugin::PluginBox;
    use rman_scene::RiCall;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::context::Handle;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder(Log);

    impl RenderContext for Recorder {
        fn activate(&mut self) {
            self.0.borrow_mut().push("activate".into());
        }

        fn deactivate(&mut self) {
            self.0.borrow_mut().push("deactivate".into());
        }

        fn abort(&mut self) {
            self.0.borrow_mut().push("abort".into());
        }

        fn end(&mut self) -> Result<()> {
            self.0.borrow_mut().push("end".into());
            Ok(())
        }

        fn request(
            &mut self,
            call: RiCall,
            _tokens: &[Token],
            _values: &[ParamValues<'_>],
        ) -> Result<Option<Handle>> {
            self.0.borrow_mut().push(call.name().into());
            Ok(None)
        }
    }

    struct RecorderCreator(Log);

    impl ContextCreator for RecorderCreator {
        fn create(&self, _params: &ParameterList) -> Result<Box<dyn RenderContext>> {
            Ok(Box::new(Recorder(Rc::clone(&self.0))))
        }
    }

    struct Failing;

    impl ContextCreator for Failing {
        fn create(&self, _params: &ParameterList) -> Result<Box<dyn RenderContext>> {
            Err(RiError::severe(ErrorCode::System, "no renderer"))
        }
    }

    fn creator(log: &Log) -> Result<PluginRef<dyn ContextCreator>> {
        let creator: Box<dyn ContextCreator> = Box::new(RecorderCreator(Rc::clone(log)));
        Ok(Rc::new(PluginBox::owned(creator)))
    }

    #[test]
    fn begin_twice_gives_distinct_handles() {
        let log = Log::default();
        let mut manager = ContextManager::new();
        let (a, ra) = manager.begin("test", creator(&log), &ParameterList::new());
        let (b, rb) = manager.begin("test", creator(&log), &ParameterList::new());
        assert!(ra.is_ok() && rb.is_ok());
        assert_ne!(a, b);
        assert_eq!(manager.current(), b);
        assert_eq!(manager.len(), 2);
        assert_eq!(*log.borrow(), ["activate", "deactivate", "activate"]);
    }

    #[test]
    fn ended_handle_is_bad() {
        let log = Log::default();
        let mut manager = ContextManager::new();
        let (a, _) = manager.begin("test", creator(&log), &ParameterList::new());
        manager.end().unwrap();
        assert_eq!(manager.current(), ContextHandle::ILLEGAL);
        let err = manager.switch_to(a).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadHandle);
        assert!(!manager.valid());
    }

    #[test]
    fn failed_begin_is_aborted_but_can_end() {
        let mut manager = ContextManager::new();
        let failing: Box<dyn ContextCreator> = Box::new(Failing);
        let (handle, result) = manager.begin(
            "failing",
            Ok(Rc::new(PluginBox::owned(failing))),
            &ParameterList::new(),
        );
        assert!(result.is_err());
        assert!(handle.is_valid());
        assert!(!manager.valid());
        assert!(manager.aborted());
        assert!(manager.end().is_ok());
        assert!(manager.is_empty());
    }

    #[test]
    fn abort_keeps_the_context_current() {
        let log = Log::default();
        let mut manager = ContextManager::new();
        let (handle, _) = manager.begin("test", creator(&log), &ParameterList::new());
        manager.abort();
        assert_eq!(manager.current(), handle);
        assert!(manager.aborted());
        assert!(manager.backend_mut().is_none());
        manager.end().unwrap();
        assert_eq!(*log.borrow(), ["activate", "abort", "end"]);
    }

    #[test]
    fn switching_reactivates() {
        let log = Log::default();
        let mut manager = ContextManager::new();
        let (a, _) = manager.begin("test", creator(&log), &ParameterList::new());
        let (_b, _) = manager.begin("test", creator(&log), &ParameterList::new());
        manager.switch_to(a).unwrap();
        assert_eq!(manager.current(), a);
        assert_eq!(
            *log.borrow(),
            ["activate", "deactivate", "activate", "deactivate", "activate"]
        );
    }
}
