#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub use rman_bridge as bridge;
pub use rman_core as types;
pub use rman_plugin as plugin;
pub use rman_scene as scene;
pub use rman_state as state;

pub use glam;

pub use rman_bridge::{
    Backend, BaseRenderer, Bridge, BridgeSettings, ContextCreator, ErrorHandler, ErrorPolicy,
    Expand, RenderContext,
};
pub use rman_bridge::backends::{
    NULL, NullCreator, RIBWRITER, RibWriterCreator, SCENE, SceneCreator, SharedBuffer,
};
pub use rman_core::{
    ArchiveHandle, Basis, Bound, ContextHandle, ErrorCode, LightHandle, Matrix, ObjectHandle,
    ParamValues, ParameterList, Request, Result, RiError, Severity, Token, tokens,
};
pub use rman_scene::{Phase, Procedural, RenderCallbacks, RiCall, RiCommand, SceneGraph, Subdivider};
pub use rman_state::RenderState;
