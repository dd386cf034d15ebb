//! Plugin loading for the RMan interface.
//!
//! Back ends and stream handlers are resolved by name through a
//! [`PluginHandler`]: host-registered [`MemoryFactory`]s first, then shared
//! libraries on a [`SearchPath`] loaded as [`LibraryFactory`]s. Every factory
//! is gated on the major version and type string of its
//! [`PluginInterface`].

pub mod errors;
pub mod factory;
pub mod handler;
pub mod plugin;
pub mod search_path;

pub use errors::PluginError;
pub use factory::{LibraryFactory, MemoryFactory, PluginFactory, PluginRef, PluginSymbols};
pub use handler::PluginHandler;
pub use plugin::{PluginBox, PluginInfo, PluginInterface};
pub use search_path::SearchPath;

/// Exports the library entry points of a plugin.
///
/// ```rust,ignore
/// rman_plugin::export_plugin! {
///     interface: dyn ContextCreator,
///     name: "mybackend",
///     plugin_type: "ContextCreator",
///     version: (1, 0, 0),
///     construct: MyBackendCreator::default(),
/// }
/// ```
///
/// Also defines `rman_plugin_symbols()`, the same entry points as a
/// [`PluginSymbols`] table for linking the plugin into a host directly.
#[macro_export]
macro_rules! export_plugin {
    (
        interface: $iface:ty,
        name: $name:literal,
        plugin_type: $plugin_type:literal,
        version: ($major:expr, $minor:expr, $revision:expr),
        construct: $construct:expr $(,)?
    ) => {
        /// # Safety
        ///
        /// `plugin_type` must be null or a NUL-terminated string.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn rman_new_plugin(
            major: u64,
            plugin_type: *const ::std::ffi::c_char,
        ) -> *mut ::std::ffi::c_void {
            if plugin_type.is_null() || major != $major {
                return ::std::ptr::null_mut();
            }
            // SAFETY: non-null and NUL-terminated per the contract.
            let requested = unsafe { ::std::ffi::CStr::from_ptr(plugin_type) };
            if requested.to_bytes() != $plugin_type.as_bytes() {
                return ::std::ptr::null_mut();
            }
            // A panicking constructor must not unwind into the host.
            let constructed = ::std::panic::catch_unwind(|| {
                let plugin: ::std::boxed::Box<$iface> = ::std::boxed::Box::new($construct);
                plugin
            });
            match constructed {
                Ok(plugin) => ::std::boxed::Box::into_raw(::std::boxed::Box::new(plugin)).cast(),
                Err(_) => ::std::ptr::null_mut(),
            }
        }

        /// # Safety
        ///
        /// `raw` must come from `rman_new_plugin` and is released once.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn rman_delete_plugin(raw: *mut ::std::ffi::c_void) {
            if !raw.is_null() {
                // SAFETY: created by `rman_new_plugin` above.
                drop(unsafe { ::std::boxed::Box::from_raw(raw.cast::<::std::boxed::Box<$iface>>()) });
            }
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn rman_major_version() -> u64 {
            $major
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn rman_minor_version() -> u64 {
            $minor
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn rman_revision() -> u64 {
            $revision
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn rman_plugin_type() -> *const ::std::ffi::c_char {
            concat!($plugin_type, "\0").as_ptr().cast()
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn rman_plugin_name() -> *const ::std::ffi::c_char {
            concat!($name, "\0").as_ptr().cast()
        }

        #[allow(dead_code)]
        pub fn rman_plugin_symbols() -> $crate::PluginSymbols {
            $crate::PluginSymbols {
                new_plugin: rman_new_plugin,
                delete_plugin: rman_delete_plugin,
                major_version: rman_major_version,
                minor_version: rman_minor_version,
                revision: rman_revision,
                plugin_type: rman_plugin_type,
                plugin_name: rman_plugin_name,
            }
        }
    };
}
