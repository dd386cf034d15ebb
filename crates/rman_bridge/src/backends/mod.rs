//! Built-in back ends.
//!
//! | name        | output                                   |
//! |-------------|------------------------------------------|
//! | `ribwriter` | ASCII RIB to a file, stdout or a buffer  |
//! | `scene`     | a [`SceneGraph`](rman_scene::SceneGraph) |
//! | `null`      | nothing                                  |

pub mod null;
pub mod rib;
pub mod scene;

use rman_plugin::{MemoryFactory, PluginHandler, PluginInfo};

use crate::context::ContextCreator;

pub use null::{NullBackend, NullCreator};
pub use rib::{RibBackend, RibWriterCreator, SharedBuffer};
pub use scene::{SceneBackend, SceneCreator, SceneSlot};

pub const RIBWRITER: &str = "ribwriter";
pub const SCENE: &str = "scene";
pub const NULL: &str = "null";

/// Registers the built-in renderers; `scene` contexts deliver into `slot`.
pub fn register_builtin(
    handler: &mut PluginHandler<dyn ContextCreator>,
    slot: &SceneSlot,
) -> rman_core::Result<()> {
    let scene_slot = slot.clone();
    let factories = [
        MemoryFactory::<dyn ContextCreator>::new(
            PluginInfo::for_interface::<dyn ContextCreator>(RIBWRITER, 0, 0),
            || Box::new(RibWriterCreator::new()) as Box<dyn ContextCreator>,
        ),
        MemoryFactory::<dyn ContextCreator>::new(
            PluginInfo::for_interface::<dyn ContextCreator>(SCENE, 0, 0),
            move || Box::new(SceneCreator::new(scene_slot.clone())) as Box<dyn ContextCreator>,
        ),
        MemoryFactory::<dyn ContextCreator>::new(
            PluginInfo::for_interface::<dyn ContextCreator>(NULL, 0, 0),
            || Box::new(NullCreator) as Box<dyn ContextCreator>,
        ),
    ];
    for factory in factories {
        handler.register(Box::new(factory?))?;
    }
    Ok(())
}
