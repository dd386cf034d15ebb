//! Graphics state of the RMan interface.
//!
//! Options, attributes and the current transformation, organised as stacks
//! that follow the block structure of the request stream.

pub mod attributes;
pub mod modes;
pub mod options;
pub mod render_state;
pub mod stack;
pub mod transform;

pub use attributes::{Attributes, ColorValue, Orientation, ShaderBinding, ShaderSlot, TrimCurve};
pub use modes::{Mode, MotionState};
pub use options::{ColorSamples, DisplayDesc, Options};
pub use render_state::RenderState;
pub use stack::{StateKind, StateRecord, StateStack};
pub use transform::TransformState;
