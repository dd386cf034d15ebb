//! Expansion Integration Tests
//!
//! Tests for:
//! - Object definitions: recording, instancing, transform restore
//! - Inline archives: ReadArchive replay
//! - Host procedurals: subdivision inside an attribute block
//! - Scene back end: captured graphs and instance links

use std::cell::Cell;
use std::rc::Rc;

use rman::bridge::Handle;
use rman::scene::CommandSink;
use rman::{
    Backend, BaseRenderer, Bridge, BridgeSettings, ErrorCode, Expand, ParamValues,
    ParameterList, Procedural, RenderCallbacks, RenderContext, RenderState, Request, Result,
    RiCall, RiCommand, SCENE, Subdivider, Token,
};

/// Records the requests that reach the `do` phase.
struct Trace {
    expand: Expand,
    seen: Vec<Request>,
}

impl Trace {
    fn expanding(expand: Expand) -> Self {
        Self {
            expand,
            seen: Vec::new(),
        }
    }
}

impl RenderCallbacks for Trace {
    fn do_command(&mut self, _state: &RenderState, cmd: &RiCommand) -> Result<()> {
        self.seen.push(cmd.request());
        Ok(())
    }
}

impl Backend for Trace {
    fn expand(&self) -> Expand {
        self.expand
    }
}

fn sphere() -> RiCall {
    RiCall::Sphere {
        radius: 1.0,
        zmin: -1.0,
        zmax: 1.0,
        thetamax: 360.0,
        params: ParameterList::new(),
    }
}

fn call(ctx: &mut BaseRenderer<Trace>, call: RiCall) -> Option<Handle> {
    ctx.request(call, &[], &[]).unwrap()
}

fn define_ball(ctx: &mut BaseRenderer<Trace>) -> rman::ObjectHandle {
    let handle = call(
        ctx,
        RiCall::ObjectBegin {
            handle: rman::ObjectHandle::ILLEGAL,
        },
    )
    .and_then(Handle::object)
    .unwrap();
    call(ctx, sphere());
    call(ctx, RiCall::ObjectEnd {});
    handle
}

// ============================================================================
// Objects
// ============================================================================

#[test]
fn instances_are_expanded_when_asked() {
    let mut ctx = BaseRenderer::new(Trace::expanding(Expand::OBJECTS));
    call(&mut ctx, RiCall::WorldBegin {});
    let ball = define_ball(&mut ctx);
    call(&mut ctx, RiCall::ObjectInstance { handle: ball });
    call(&mut ctx, RiCall::ObjectInstance { handle: ball });
    call(&mut ctx, RiCall::WorldEnd {});

    assert_eq!(
        ctx.backend().seen,
        [Request::WorldBegin, Request::Sphere, Request::Sphere, Request::WorldEnd]
    );
    assert_eq!(ctx.object(ball).unwrap().body().count(), 1);
}

#[test]
fn instances_pass_through_otherwise() {
    let mut ctx = BaseRenderer::new(Trace::expanding(Expand::empty()));
    call(&mut ctx, RiCall::WorldBegin {});
    let ball = define_ball(&mut ctx);
    call(&mut ctx, RiCall::ObjectInstance { handle: ball });

    assert_eq!(
        ctx.backend().seen,
        [
            Request::WorldBegin,
            Request::ObjectBegin,
            Request::Sphere,
            Request::ObjectEnd,
            Request::ObjectInstance,
        ]
    );
}

#[test]
fn unknown_instance_is_bad_handle() {
    let mut ctx = BaseRenderer::new(Trace::expanding(Expand::OBJECTS));
    call(&mut ctx, RiCall::WorldBegin {});
    let err = ctx
        .request(
            RiCall::ObjectInstance {
                handle: rman::ObjectHandle(99),
            },
            &[],
            &[],
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BadHandle);
}

#[test]
fn instancing_keeps_the_callers_transform() {
    let mut ctx = BaseRenderer::new(Trace::expanding(Expand::OBJECTS));
    call(&mut ctx, RiCall::WorldBegin {});
    let handle = call(
        &mut ctx,
        RiCall::ObjectBegin {
            handle: rman::ObjectHandle::ILLEGAL,
        },
    )
    .and_then(Handle::object)
    .unwrap();
    call(
        &mut ctx,
        RiCall::Translate {
            dx: 5.0,
            dy: 0.0,
            dz: 0.0,
        },
    );
    call(&mut ctx, sphere());
    call(&mut ctx, RiCall::ObjectEnd {});

    let before = *ctx.state().transform().matrix();
    call(&mut ctx, RiCall::ObjectInstance { handle });
    assert_eq!(*ctx.state().transform().matrix(), before);
}

// ============================================================================
// Archives
// ============================================================================

#[test]
fn inline_archive_is_replayed_by_read_archive() {
    let mut ctx = BaseRenderer::new(Trace::expanding(Expand::ARCHIVES));
    call(
        &mut ctx,
        RiCall::ArchiveBegin {
            name: Token::new("ball.rib"),
            params: ParameterList::new(),
        },
    );
    call(&mut ctx, sphere());
    call(&mut ctx, RiCall::ArchiveEnd {});
    assert!(ctx.archive("ball.rib").is_some());

    call(&mut ctx, RiCall::WorldBegin {});
    call(
        &mut ctx,
        RiCall::ReadArchive {
            name: Token::new("ball.rib"),
            params: ParameterList::new(),
        },
    );

    assert_eq!(ctx.backend().seen, [Request::WorldBegin, Request::Sphere]);
}

#[test]
fn missing_archive_is_no_file_when_expanding() {
    let mut ctx = BaseRenderer::new(Trace::expanding(Expand::ARCHIVES));
    call(&mut ctx, RiCall::WorldBegin {});
    let err = ctx
        .request(
            RiCall::ReadArchive {
                name: Token::new("missing.rib"),
                params: ParameterList::new(),
            },
            &[],
            &[],
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NoFile);
}

// ============================================================================
// Procedurals
// ============================================================================

#[derive(Debug, Default)]
struct Spheres {
    freed: Cell<bool>,
}

impl Subdivider for Spheres {
    fn name(&self) -> &str {
        "Spheres"
    }

    fn subdivide(&self, args: &[String], _detail: f32, sink: &mut dyn CommandSink) -> Result<()> {
        for _ in args {
            sink.emit(sphere())?;
        }
        Ok(())
    }

    fn free(&self, _args: &[String]) {
        self.freed.set(true);
    }
}

#[test]
fn host_procedural_expands_and_frees() {
    let spheres = Rc::new(Spheres::default());
    let mut ctx = BaseRenderer::new(Trace::expanding(Expand::PROCEDURALS));
    call(&mut ctx, RiCall::WorldBegin {});
    let depth = ctx.state().modes().len();
    call(
        &mut ctx,
        RiCall::Procedural {
            procedural: Procedural::host(spheres.clone(), vec!["a".into(), "b".into(), "c".into()]),
            bound: [-1.0, 1.0, -1.0, 1.0, -1.0, 1.0],
        },
    );

    assert_eq!(
        ctx.backend().seen,
        [Request::WorldBegin, Request::Sphere, Request::Sphere, Request::Sphere]
    );
    assert!(spheres.freed.get());
    assert_eq!(ctx.state().modes().len(), depth);
}

// ============================================================================
// Scene back end
// ============================================================================

#[test]
fn scene_context_links_instances_to_definitions() {
    let mut ri = Bridge::with_settings(BridgeSettings::default());
    ri.begin(SCENE, &[]).unwrap();
    ri.world_begin().unwrap();
    let ball = ri.object_begin().unwrap();
    ri.sphere(1.0, -1.0, 1.0, 360.0, &[]).unwrap();
    ri.object_end().unwrap();
    ri.object_instance(ball).unwrap();
    ri.world_end().unwrap();
    ri.end().unwrap();

    let graph = ri.take_scene().unwrap();
    let visited: Vec<(Request, bool)> = graph
        .iter()
        .map(|visit| (visit.command.request(), visit.linked))
        .collect();
    assert!(visited.contains(&(Request::Sphere, true)));
    assert_eq!(visited.first(), Some(&(Request::WorldBegin, false)));
    assert!(ri.take_scene().is_none());
}

#[test]
fn null_context_validates_expanded_calls() {
    let mut ri = Bridge::with_settings(BridgeSettings::default());
    ri.begin(rman::NULL, &[]).unwrap();
    ri.world_begin().unwrap();
    let ball = ri.object_begin().unwrap();
    ri.polygon(&[("P", ParamValues::Floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0]))])
        .unwrap();
    ri.object_end().unwrap();
    ri.object_instance(ball).unwrap();
    ri.object_instance(rman::ObjectHandle(1234)).unwrap();
    assert_eq!(ri.last_error(), Some(ErrorCode::BadHandle));
    ri.world_end().unwrap();
    ri.end().unwrap();
}
