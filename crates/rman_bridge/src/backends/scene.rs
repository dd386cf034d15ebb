//! The `scene` back end: captures the call stream into a [`SceneGraph`].

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use rustc_hash::FxHashMap;

use rman_core::{ErrorCode, ObjectHandle, ParameterList, Result, RiError};
use rman_scene::{NodeId, RenderCallbacks, RiCall, RiCommand, SceneBuilder, SceneGraph};
use rman_state::RenderState;

use crate::base::{Backend, BaseRenderer};
use crate::context::{ContextCreator, RenderContext};

/// Where a `scene` context leaves its graph on `End`.
#[derive(Debug, Clone, Default)]
pub struct SceneSlot(Rc<RefCell<Option<SceneGraph>>>);

impl SceneSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the graph of the last context that ended.
    #[must_use]
    pub fn take(&self) -> Option<SceneGraph> {
        self.0.borrow_mut().take()
    }

    fn put(&self, graph: SceneGraph) {
        *self.0.borrow_mut() = Some(graph);
    }
}

/// Captures commands in call order. Blocks become descendent chains and
/// `ObjectInstance` links to the body of its object definition.
#[derive(Debug, Default)]
pub struct SceneBackend {
    builder: SceneBuilder,
    objects: FxHashMap<ObjectHandle, NodeId>,
    slot: SceneSlot,
    aborted: bool,
}

impl SceneBackend {
    #[must_use]
    pub fn new(slot: SceneSlot) -> Self {
        Self {
            slot,
            ..Self::default()
        }
    }

    /// The graph captured so far.
    #[must_use]
    pub fn graph(&self) -> &SceneGraph {
        self.builder.graph()
    }
}

impl RenderCallbacks for SceneBackend {
    fn do_command(&mut self, _state: &RenderState, cmd: &RiCommand) -> Result<()> {
        let request = cmd.request();
        let command = cmd.duplicate();
        match &cmd.call {
            RiCall::ObjectBegin { handle } => {
                let id = self.builder.insert_and_descent(command);
                self.objects.insert(*handle, id);
            }
            RiCall::ObjectInstance { handle } => {
                let block = self.objects.get(handle).copied().ok_or_else(|| {
                    RiError::error(ErrorCode::BadHandle, format!("unknown object {handle}"))
                })?;
                self.builder.insert_and_link(command, block)?;
            }
            _ if request.is_block_begin() => {
                self.builder.insert_and_descent(command);
            }
            _ if request.is_block_end() => {
                self.builder.insert_and_ascent(command)?;
            }
            _ => {
                self.builder.insert_and_next(command);
            }
        }
        Ok(())
    }
}

impl Backend for SceneBackend {
    fn abort(&mut self) {
        self.aborted = true;
    }

    fn end(&mut self, _state: &RenderState) -> Result<()> {
        let builder = std::mem::take(&mut self.builder);
        if self.aborted {
            debug!("Dropping scene of an aborted context");
            return Ok(());
        }
        let graph = builder.finish()?;
        debug!("Captured scene with {} commands", graph.len());
        self.slot.put(graph);
        Ok(())
    }
}

/// Creates `scene` contexts that all deliver into one slot.
#[derive(Debug, Clone, Default)]
pub struct SceneCreator {
    slot: SceneSlot,
}

impl SceneCreator {
    #[must_use]
    pub fn new(slot: SceneSlot) -> Self {
        Self { slot }
    }
}

impl ContextCreator for SceneCreator {
    fn create(&self, _params: &ParameterList) -> Result<Box<dyn RenderContext>> {
        Ok(Box::new(BaseRenderer::new(SceneBackend::new(self.slot.clone()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rman_core::{Request, Token};
    use rman_scene::Visit;

    fn call(ctx: &mut dyn RenderContext, call: RiCall) {
        ctx.request(call, &[], &[]).unwrap();
    }

    #[test]
    fn instances_link_to_object_bodies() {
        let slot = SceneSlot::new();
        let mut ctx = SceneCreator::new(slot.clone())
            .create(&ParameterList::new())
            .unwrap();
        let object = ctx
            .request(RiCall::ObjectBegin { handle: ObjectHandle::ILLEGAL }, &[], &[])
            .unwrap()
            .and_then(|h| h.object())
            .unwrap();
        call(ctx.as_mut(), RiCall::Translate { dx: 1.0, dy: 0.0, dz: 0.0 });
        call(ctx.as_mut(), RiCall::ObjectEnd {});
        call(ctx.as_mut(), RiCall::WorldBegin {});
        call(ctx.as_mut(), RiCall::ObjectInstance { handle: object });
        call(ctx.as_mut(), RiCall::WorldEnd {});
        ctx.end().unwrap();

        let graph = slot.take().unwrap();
        let visits: Vec<(Request, usize, bool)> = graph
            .iter()
            .map(|v: Visit<'_>| (v.command.request(), v.depth, v.linked))
            .collect();
        assert_eq!(
            visits,
            [
                (Request::ObjectBegin, 0, false),
                (Request::Translate, 1, false),
                (Request::ObjectEnd, 1, false),
                (Request::WorldBegin, 0, false),
                (Request::ObjectInstance, 1, false),
                (Request::Translate, 2, true),
                (Request::ObjectEnd, 2, true),
                (Request::WorldEnd, 1, false),
            ]
        );
        // the link does not own the body
        assert_eq!(graph.len(), 6);
    }

    #[test]
    fn aborted_scene_is_dropped() {
        let slot = SceneSlot::new();
        let mut ctx = SceneCreator::new(slot.clone())
            .create(&ParameterList::new())
            .unwrap();
        call(ctx.as_mut(), RiCall::WorldBegin {});
        call(
            ctx.as_mut(),
            RiCall::Surface {
                name: Token::new("matte"),
                params: ParameterList::new(),
            },
        );
        ctx.abort();
        assert!(ctx.end().is_ok());
        assert!(slot.take().is_none());
    }
}
