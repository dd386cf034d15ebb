//! Bridge Integration Tests
//!
//! Tests for:
//! - Context lifecycle: begin, switch, end, abort
//! - Error routing: NotStarted vs. aborted contexts, error policies
//! - Parameter binding through the RIB writer, including element limits
//! - Renderer plugin resolution

use std::rc::Rc;

use rman::bridge::backends::{SceneSlot, register_builtin};
use rman::plugin::PluginHandler;
use rman::{
    Bridge, BridgeSettings, ContextCreator, ContextHandle, ErrorCode, ErrorPolicy, ParamValues,
    RIBWRITER, RibWriterCreator, SharedBuffer,
};

const HEADER: &str = "##RenderMan RIB-Structure 1.1\nversion 3.04\n";

fn capture() -> (Bridge, SharedBuffer) {
    let mut bridge = Bridge::with_settings(BridgeSettings::default());
    let buffer = SharedBuffer::new();
    let shared = buffer.clone();
    bridge
        .register_renderer("capture", move || RibWriterCreator::with_buffer(shared.clone()))
        .unwrap();
    (bridge, buffer)
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn begin_end_roundtrip_writes_rib() {
    let (mut ri, buffer) = capture();
    let ctx = ri.begin("capture", &[]).unwrap();
    assert_eq!(ri.get_context(), ctx);

    ri.world_begin().unwrap();
    ri.sphere(1.0, -1.0, 1.0, 360.0, &[]).unwrap();
    ri.world_end().unwrap();
    ri.end().unwrap();

    assert_eq!(
        buffer.text(),
        format!("{HEADER}WorldBegin\n  Sphere 1 -1 1 360\nWorldEnd\n")
    );
    assert_eq!(ri.get_context(), ContextHandle::ILLEGAL);
    assert_eq!(ri.last_error(), None);
}

#[test]
fn end_without_context_is_not_started() {
    let mut ri = Bridge::with_settings(BridgeSettings::default());
    ri.end().unwrap();
    assert_eq!(ri.last_error(), Some(ErrorCode::NotStarted));
}

#[test]
fn switching_contexts_routes_calls() {
    let mut ri = Bridge::with_settings(BridgeSettings::default());
    let first_buffer = SharedBuffer::new();
    let second_buffer = SharedBuffer::new();
    let (a, b) = (first_buffer.clone(), second_buffer.clone());
    ri.register_renderer("first", move || RibWriterCreator::with_buffer(a.clone()))
        .unwrap();
    ri.register_renderer("second", move || RibWriterCreator::with_buffer(b.clone()))
        .unwrap();

    let first = ri.begin("first", &[]).unwrap();
    let second = ri.begin("second", &[]).unwrap();
    assert_ne!(first, second);

    ri.identity().unwrap();
    ri.context(first).unwrap();
    ri.frame_begin(7).unwrap();
    ri.frame_end().unwrap();

    assert_eq!(first_buffer.text(), format!("{HEADER}FrameBegin 7\nFrameEnd\n"));
    assert_eq!(second_buffer.text(), format!("{HEADER}Identity\n"));

    ri.end().unwrap();
    ri.context(second).unwrap();
    ri.end().unwrap();
    assert!(ri.contexts().is_empty());
}

#[test]
fn unknown_context_handle_is_bad_handle() {
    let (mut ri, _) = capture();
    let ctx = ri.begin("capture", &[]).unwrap();
    ri.end().unwrap();
    ri.context(ctx).unwrap();
    assert_eq!(ri.last_error(), Some(ErrorCode::BadHandle));
    assert_eq!(ri.get_context(), ContextHandle::ILLEGAL);
}

// ============================================================================
// Error routing
// ============================================================================

#[test]
fn calls_after_abort_are_silent_until_end() {
    let (mut ri, buffer) = capture();
    ri.begin("capture", &[]).unwrap();
    ri.abort();
    buffer.clear();

    ri.world_begin().unwrap();
    ri.sphere(1.0, -1.0, 1.0, 360.0, &[]).unwrap();
    assert_eq!(ri.last_error(), None);
    assert!(buffer.text().is_empty());

    ri.end().unwrap();
    ri.world_begin().unwrap();
    assert_eq!(ri.last_error(), Some(ErrorCode::NotStarted));
}

#[test]
fn abort_policy_returns_errors() {
    let (mut ri, _) = capture();
    ri.error_handler(ErrorPolicy::Abort).unwrap();
    ri.begin("capture", &[]).unwrap();
    let err = ri.attribute_end().unwrap_err();
    assert_eq!(err.code, ErrorCode::Nesting);
    ri.end().unwrap();
}

#[test]
fn error_handler_is_recorded_in_rib() {
    let (mut ri, buffer) = capture();
    ri.begin("capture", &[]).unwrap();
    ri.error_handler(ErrorPolicy::Ignore).unwrap();
    ri.end().unwrap();
    assert_eq!(buffer.text(), format!("{HEADER}ErrorHandler \"ignore\"\n"));
}

#[test]
fn severe_errors_abort_the_context() {
    let mut ri = Bridge::with_settings(BridgeSettings::default());
    ri.begin(
        RIBWRITER,
        &[("file", ParamValues::Strings(&["/nonexistent-dir/out.rib"]))],
    )
    .unwrap();
    assert_eq!(ri.last_error(), Some(ErrorCode::System));
    assert!(ri.contexts().aborted());
    ri.end().unwrap();
}

// ============================================================================
// Parameter binding
// ============================================================================

#[test]
fn polygon_binds_vertex_and_varying_color() {
    let (mut ri, buffer) = capture();
    ri.begin("capture", &[]).unwrap();
    ri.world_begin().unwrap();
    buffer.clear();

    let p = [-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0];
    let cs = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
    ri.polygon(&[("P", ParamValues::Floats(&p)), ("Cs", ParamValues::Floats(&cs))])
        .unwrap();

    assert_eq!(ri.last_error(), None);
    assert_eq!(
        buffer.text(),
        "  Polygon \"P\" [-1 -1 0 1 -1 0 1 1 0 -1 1 0] \"Cs\" [1 0 0 0 1 0 0 0 1 1 1 1]\n"
    );
    ri.world_end().unwrap();
    ri.end().unwrap();
}

#[test]
fn short_color_list_is_reported_and_dropped() {
    let (mut ri, buffer) = capture();
    ri.begin("capture", &[]).unwrap();
    ri.world_begin().unwrap();
    buffer.clear();

    let p = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
    ri.polygon(&[("P", ParamValues::Floats(&p)), ("Cs", ParamValues::Floats(&[1.0, 0.0, 0.0]))])
        .unwrap();

    assert_eq!(ri.last_error(), Some(ErrorCode::MissingData));
    assert_eq!(buffer.text(), "  Polygon \"P\" [0 0 0 1 0 0 1 1 0]\n");
    ri.world_end().unwrap();
    ri.end().unwrap();
}

#[test]
fn inline_declarations_bind_without_declare() {
    let (mut ri, buffer) = capture();
    ri.begin("capture", &[]).unwrap();
    ri.world_begin().unwrap();
    buffer.clear();

    ri.surface("paint", &[("uniform float roughness2", ParamValues::Floats(&[0.25]))])
        .unwrap();
    assert_eq!(ri.last_error(), None);
    assert_eq!(buffer.text(), "  Surface \"paint\" \"uniform float roughness2\" [0.25]\n");
    ri.world_end().unwrap();
    ri.end().unwrap();
}

#[test]
fn oversized_patch_mesh_is_a_limit_error() {
    let (mut ri, buffer) = capture();
    ri.begin("capture", &[]).unwrap();
    ri.world_begin().unwrap();
    buffer.clear();

    ri.patch_mesh("bilinear", 50_000, "nonperiodic", 50_000, "nonperiodic", &[])
        .unwrap();

    assert_eq!(ri.last_error(), Some(ErrorCode::Limit));
    assert_eq!(buffer.text(), "");
    ri.world_end().unwrap();
    ri.end().unwrap();
}

// ============================================================================
// Renderer plugins
// ============================================================================

#[test]
fn last_plugin_reuses_the_creator() {
    let slot = SceneSlot::new();
    let mut handler = PluginHandler::<dyn ContextCreator>::default();
    register_builtin(&mut handler, &slot).unwrap();

    let a = handler.last_plugin(RIBWRITER).unwrap();
    let b = handler.last_plugin(RIBWRITER).unwrap();
    assert!(Rc::ptr_eq(&a, &b));
    let c = handler.new_plugin(RIBWRITER).unwrap();
    assert!(!Rc::ptr_eq(&a, &c));
}

#[test]
fn empty_renderer_name_uses_settings() {
    let buffer = SharedBuffer::new();
    let shared = buffer.clone();
    let mut ri = Bridge::with_settings(BridgeSettings {
        renderer: "capture".into(),
        ..BridgeSettings::default()
    });
    ri.register_renderer("capture", move || RibWriterCreator::with_buffer(shared.clone()))
        .unwrap();
    ri.begin("", &[]).unwrap();
    ri.end().unwrap();
    assert_eq!(buffer.text(), HEADER);
}
