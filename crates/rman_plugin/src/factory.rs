//! Plugin Factories
//!
//! # Overview
//!
//! A [`PluginFactory`] creates instances of one plugin and keeps every
//! instance it created in a registry until it is deleted or the factory is
//! dropped. Two kinds exist:
//!
//! - [`MemoryFactory`] constructs instances in-process from a closure.
//! - [`LibraryFactory`] calls the entry points of a shared library, resolved
//!   into a [`PluginSymbols`] table.
//!
//! Both validate the reported major version and type string against the
//! interface when the factory is created and again on every instantiation.
//!
//! # Library entry points
//!
//! A plugin library exports seven `extern "C"` functions, generated by
//! [`export_plugin!`](crate::export_plugin):
//!
//! | symbol                | signature                                  |
//! |-----------------------|--------------------------------------------|
//! | `rman_new_plugin`     | `(major: u64, type: *const c_char) -> *mut c_void` |
//! | `rman_delete_plugin`  | `(*mut c_void)`                            |
//! | `rman_major_version`  | `() -> u64`                                |
//! | `rman_minor_version`  | `() -> u64`                                |
//! | `rman_revision`       | `() -> u64`                                |
//! | `rman_plugin_type`    | `() -> *const c_char`                      |
//! | `rman_plugin_name`    | `() -> *const c_char`                      |
//!
//! `rman_new_plugin` returns a `Box<Box<dyn Interface>>` turned into a raw
//! pointer, or null.

use std::ffi::{CStr, CString, c_char, c_void};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::rc::Rc;

use libloading::Library;
use log::debug;
use slotmap::{SlotMap, new_key_type};

use crate::errors::PluginError;
use crate::plugin::{DeletePluginFn, PluginBox, PluginInfo, PluginInterface};

/// Shared handle to a created instance.
pub type PluginRef<P> = Rc<PluginBox<P>>;

pub type NewPluginFn = unsafe extern "C" fn(u64, *const c_char) -> *mut c_void;
pub type VersionFn = unsafe extern "C" fn() -> u64;
pub type NameFn = unsafe extern "C" fn() -> *const c_char;

pub const NEW_PLUGIN_SYMBOL: &[u8] = b"rman_new_plugin\0";
pub const DELETE_PLUGIN_SYMBOL: &[u8] = b"rman_delete_plugin\0";
pub const MAJOR_VERSION_SYMBOL: &[u8] = b"rman_major_version\0";
pub const MINOR_VERSION_SYMBOL: &[u8] = b"rman_minor_version\0";
pub const REVISION_SYMBOL: &[u8] = b"rman_revision\0";
pub const PLUGIN_TYPE_SYMBOL: &[u8] = b"rman_plugin_type\0";
pub const PLUGIN_NAME_SYMBOL: &[u8] = b"rman_plugin_name\0";

/// Creates and tracks instances of one plugin.
pub trait PluginFactory<P: ?Sized + 'static> {
    fn info(&self) -> &PluginInfo;

    /// Creates an instance for a caller requiring `major` and `plugin_type`.
    fn new_plugin(&mut self, major: u64, plugin_type: &str) -> Result<PluginRef<P>, PluginError>;

    /// Forgets `plugin`; it is destroyed once the last handle is dropped.
    /// Returns `false` if this factory did not create it.
    fn delete_plugin(&mut self, plugin: &PluginRef<P>) -> bool;

    /// Number of live instances in the registry.
    fn instance_count(&self) -> usize;
}

new_key_type! {
    struct InstanceId;
}

struct Registry<P: ?Sized + 'static> {
    instances: SlotMap<InstanceId, PluginRef<P>>,
}

impl<P: ?Sized + 'static> Registry<P> {
    fn new() -> Self {
        Self {
            instances: SlotMap::with_key(),
        }
    }

    fn insert(&mut self, plugin: PluginBox<P>) -> PluginRef<P> {
        let plugin = Rc::new(plugin);
        self.instances.insert(Rc::clone(&plugin));
        plugin
    }

    fn remove(&mut self, plugin: &PluginRef<P>) -> bool {
        let found = self
            .instances
            .iter()
            .find(|(_, p)| Rc::ptr_eq(p, plugin))
            .map(|(id, _)| id);
        found.is_some_and(|id| self.instances.remove(id).is_some())
    }

    fn len(&self) -> usize {
        self.instances.len()
    }

    fn clear(&mut self) {
        self.instances.clear();
    }
}

// ============================================================================
// In-memory factory
// ============================================================================

/// Factory constructing instances with a closure.
pub struct MemoryFactory<P: ?Sized + 'static> {
    info: PluginInfo,
    construct: Box<dyn Fn() -> Box<P>>,
    registry: Registry<P>,
}

impl<P: PluginInterface + ?Sized + 'static> MemoryFactory<P> {
    /// Fails if `info` does not match the interface `P`.
    pub fn new<F>(info: PluginInfo, construct: F) -> Result<Self, PluginError>
    where
        F: Fn() -> Box<P> + 'static,
    {
        info.check_interface::<P>()?;
        Ok(Self {
            info,
            construct: Box::new(construct),
            registry: Registry::new(),
        })
    }
}

impl<P: ?Sized + 'static> PluginFactory<P> for MemoryFactory<P> {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn new_plugin(&mut self, major: u64, plugin_type: &str) -> Result<PluginRef<P>, PluginError> {
        self.info.check(major, plugin_type)?;
        let plugin = PluginBox::owned((self.construct)());
        debug!("Created plugin instance {}", self.info);
        Ok(self.registry.insert(plugin))
    }

    fn delete_plugin(&mut self, plugin: &PluginRef<P>) -> bool {
        self.registry.remove(plugin)
    }

    fn instance_count(&self) -> usize {
        self.registry.len()
    }
}

// ============================================================================
// Library factory
// ============================================================================

/// The entry points of a plugin library.
#[derive(Debug, Clone, Copy)]
pub struct PluginSymbols {
    pub new_plugin: NewPluginFn,
    pub delete_plugin: DeletePluginFn,
    pub major_version: VersionFn,
    pub minor_version: VersionFn,
    pub revision: VersionFn,
    pub plugin_type: NameFn,
    pub plugin_name: NameFn,
}

impl PluginSymbols {
    /// Resolves all seven entry points from `library`.
    ///
    /// # Safety
    ///
    /// The library must export the symbols with the signatures listed in the
    /// module documentation.
    pub unsafe fn resolve(library: &Library, name: &str) -> Result<Self, PluginError> {
        unsafe fn get<T: Copy>(library: &Library, symbol: &[u8], name: &str) -> Result<T, PluginError> {
            // SAFETY: forwarded from `resolve`.
            unsafe { library.get::<T>(symbol) }
                .map(|s| *s)
                .map_err(|err| PluginError::BadFile {
                    name: name.to_owned(),
                    reason: format!(
                        "missing entry point {}: {err}",
                        String::from_utf8_lossy(symbol.strip_suffix(b"\0").unwrap_or(symbol))
                    ),
                })
        }

        // SAFETY: the caller guarantees the signatures.
        unsafe {
            Ok(Self {
                new_plugin: get(library, NEW_PLUGIN_SYMBOL, name)?,
                delete_plugin: get(library, DELETE_PLUGIN_SYMBOL, name)?,
                major_version: get(library, MAJOR_VERSION_SYMBOL, name)?,
                minor_version: get(library, MINOR_VERSION_SYMBOL, name)?,
                revision: get(library, REVISION_SYMBOL, name)?,
                plugin_type: get(library, PLUGIN_TYPE_SYMBOL, name)?,
                plugin_name: get(library, PLUGIN_NAME_SYMBOL, name)?,
            })
        }
    }

    /// Reads the metadata accessors.
    ///
    /// # Safety
    ///
    /// The accessors must be callable and return NUL-terminated strings with
    /// static lifetime (or null).
    pub unsafe fn info(&self, fallback_name: &str) -> Result<PluginInfo, PluginError> {
        let read = |f: NameFn, what: &str| -> Result<String, PluginError> {
            // SAFETY: see the function contract.
            let ptr = unsafe { f() };
            if ptr.is_null() {
                return Err(PluginError::BadFile {
                    name: fallback_name.to_owned(),
                    reason: format!("{what} accessor returned null"),
                });
            }
            // SAFETY: non-null and NUL-terminated per the contract.
            let text = unsafe { CStr::from_ptr(ptr) };
            text.to_str()
                .map(str::to_owned)
                .map_err(|err| PluginError::BadFile {
                    name: fallback_name.to_owned(),
                    reason: format!("{what} is not UTF-8: {err}"),
                })
        };
        let name = read(self.plugin_name, "name")?;
        let plugin_type = read(self.plugin_type, "type")?;
        // SAFETY: see the function contract.
        let (major, minor, revision) =
            unsafe { ((self.major_version)(), (self.minor_version)(), (self.revision)()) };
        Ok(PluginInfo::new(&name, &plugin_type, major, minor, revision))
    }
}

/// Factory calling the entry points of a plugin library.
///
/// Instances keep the library loaded while they live. Dropping the factory
/// releases its registry before its own handle on the library.
pub struct LibraryFactory<P: ?Sized + 'static> {
    info: PluginInfo,
    path: Option<PathBuf>,
    symbols: PluginSymbols,
    registry: Registry<P>,
    library: Option<Rc<Library>>,
}

impl<P: PluginInterface + ?Sized + 'static> LibraryFactory<P> {
    /// Opens the library at `path`, resolves and validates its entry points.
    /// The library must report `key` as its name. On failure the library is
    /// unloaded again.
    pub fn load(path: &Path, key: &str) -> Result<Self, PluginError> {
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        if !path.is_file() {
            return Err(PluginError::NotFound { name });
        }
        // SAFETY: loading runs the library's initialisers; plugin libraries
        // are trusted code.
        let library = unsafe { Library::new(path) }.map_err(|err| PluginError::BadFile {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        // SAFETY: plugin libraries export the documented entry points.
        let symbols = unsafe { PluginSymbols::resolve(&library, &name)? };
        // SAFETY: as above.
        let mut factory = unsafe { Self::from_symbols(symbols, Some(Rc::new(library)))? };
        factory.info.check_name(key)?;
        factory.path = Some(path.to_path_buf());
        debug!("Loaded plugin library {} from {}", factory.info, path.display());
        Ok(factory)
    }

    /// Builds a factory over already resolved entry points, e.g. those of a
    /// plugin linked into the host.
    ///
    /// # Safety
    ///
    /// The symbols must honour the entry point contract for interface `P`,
    /// and `library`, if any, must be where they came from.
    pub unsafe fn from_symbols(
        symbols: PluginSymbols,
        library: Option<Rc<Library>>,
    ) -> Result<Self, PluginError> {
        // SAFETY: forwarded from the caller.
        let info = unsafe { symbols.info("<unnamed plugin>")? };
        info.check_interface::<P>()?;
        Ok(Self {
            info,
            path: None,
            symbols,
            registry: Registry::new(),
            library,
        })
    }
}

impl<P: ?Sized + 'static> LibraryFactory<P> {
    /// File the factory was loaded from.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl<P: ?Sized + 'static> PluginFactory<P> for LibraryFactory<P> {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn new_plugin(&mut self, major: u64, plugin_type: &str) -> Result<PluginRef<P>, PluginError> {
        self.info.check(major, plugin_type)?;
        let requested = CString::new(plugin_type).map_err(|_| PluginError::TypeMismatch {
            name: self.info.name.clone(),
            found: self.info.plugin_type.clone(),
            expected: plugin_type.to_owned(),
        })?;
        // SAFETY: entry point contract.
        let raw = unsafe { (self.symbols.new_plugin)(major, requested.as_ptr()) };
        let raw = NonNull::new(raw.cast::<Box<P>>()).ok_or_else(|| PluginError::OutOfMemory {
            name: self.info.name.clone(),
        })?;
        // SAFETY: `raw` is a fresh instance owned by nobody else, released
        // through the library's own destructor.
        let plugin =
            unsafe { PluginBox::from_foreign(raw, self.symbols.delete_plugin, self.library.clone()) };
        debug!("Created plugin instance {}", self.info);
        Ok(self.registry.insert(plugin))
    }

    fn delete_plugin(&mut self, plugin: &PluginRef<P>) -> bool {
        self.registry.remove(plugin)
    }

    fn instance_count(&self) -> usize {
        self.registry.len()
    }
}

impl<P: ?Sized + 'static> Drop for LibraryFactory<P> {
    fn drop(&mut self) {
        if self.registry.len() > 0 {
            debug!(
                "Releasing {} instance(s) of plugin {}",
                self.registry.len(),
                self.info.name
            );
        }
        self.registry.clear();
    }
}
