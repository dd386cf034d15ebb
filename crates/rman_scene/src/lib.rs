//! Captured interface calls.
//!
//! The command sum type and its renderer callbacks, RIB emission, procedural
//! primitives, per-primitive geometry counts and the scene graph that stores
//! captured command streams.

mod macros;

pub mod calls;
pub mod command;
pub mod counts;
pub mod graph;
pub mod procedural;
pub mod rib;

pub use calls::{Phase, RenderCallbacks, RiCall, dispatch_fields};
pub use command::{CommandKind, RiCommand};
pub use graph::{Node, NodeId, SceneBuilder, SceneGraph, SceneIter, Visit};
pub use procedural::{CommandSink, Procedural, ProceduralKind, Subdivider};
pub use rib::{RibArg, RibWriter};
