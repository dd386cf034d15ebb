//! Plugin metadata, interface gating and owned instances.

use std::ffi::c_void;
use std::fmt;
use std::ops::Deref;
use std::ptr::NonNull;
use std::rc::Rc;

use libloading::Library;

use crate::errors::PluginError;

/// An interface that plugins implement, usually a trait object type such as
/// `dyn ContextCreator`.
pub trait PluginInterface {
    /// Type string every factory of this interface must report, compared
    /// case-sensitively.
    const TYPE: &'static str;
    /// Compiled-in major version; factories must report exactly this value.
    const MAJOR_VERSION: u64;
}

/// What a factory reports about the plugins it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub plugin_type: String,
    pub major_version: u64,
    /// Informational.
    pub minor_version: u64,
    /// Informational.
    pub revision: u64,
}

impl PluginInfo {
    #[must_use]
    pub fn new(name: &str, plugin_type: &str, major: u64, minor: u64, revision: u64) -> Self {
        Self {
            name: name.to_owned(),
            plugin_type: plugin_type.to_owned(),
            major_version: major,
            minor_version: minor,
            revision,
        }
    }

    /// Info for a plugin of interface `P` at the interface's own major
    /// version.
    #[must_use]
    pub fn for_interface<P: PluginInterface + ?Sized>(name: &str, minor: u64, revision: u64) -> Self {
        Self::new(name, P::TYPE, P::MAJOR_VERSION, minor, revision)
    }

    /// Checks the major version and type string against the required ones.
    /// Minor version and revision are not compared.
    pub fn check(&self, major: u64, plugin_type: &str) -> Result<(), PluginError> {
        if self.major_version != major {
            return Err(PluginError::VersionMismatch {
                name: self.name.clone(),
                found: self.major_version,
                expected: major,
            });
        }
        if self.plugin_type != plugin_type {
            return Err(PluginError::TypeMismatch {
                name: self.name.clone(),
                found: self.plugin_type.clone(),
                expected: plugin_type.to_owned(),
            });
        }
        Ok(())
    }

    /// Rejects a library that reports a name other than the `key` it was
    /// looked up by.
    pub fn check_name(&self, key: &str) -> Result<(), PluginError> {
        if self.name != key {
            return Err(PluginError::NameMismatch {
                name: key.to_owned(),
                found: self.name.clone(),
            });
        }
        Ok(())
    }

    /// [`check`](Self::check) against the constants of interface `P`.
    pub fn check_interface<P: PluginInterface + ?Sized>(&self) -> Result<(), PluginError> {
        self.check(P::MAJOR_VERSION, P::TYPE)
    }
}

impl fmt::Display for PluginInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {}.{}.{})",
            self.name, self.plugin_type, self.major_version, self.minor_version, self.revision
        )
    }
}

/// Destructor entry point of a shared-library plugin.
pub type DeletePluginFn = unsafe extern "C" fn(*mut c_void);

/// An instance created by a factory.
///
/// Instances built in-process are plain boxes. Instances built by a shared
/// library are released through the library's destructor entry point and keep
/// the library loaded for as long as they live.
pub struct PluginBox<P: ?Sized + 'static> {
    inner: Inner<P>,
}

enum Inner<P: ?Sized + 'static> {
    Owned(Box<P>),
    Foreign {
        raw: NonNull<Box<P>>,
        delete: DeletePluginFn,
        _library: Option<Rc<Library>>,
    },
}

impl<P: ?Sized + 'static> PluginBox<P> {
    #[must_use]
    pub fn owned(plugin: Box<P>) -> Self {
        Self {
            inner: Inner::Owned(plugin),
        }
    }

    /// Takes ownership of an instance returned by a `new_plugin` entry point.
    ///
    /// # Safety
    ///
    /// `raw` must point to a live `Box<P>` created by the code behind
    /// `delete`, and must not be released by anyone else. `library`, if any,
    /// must be the library both entry points came from.
    pub(crate) unsafe fn from_foreign(
        raw: NonNull<Box<P>>,
        delete: DeletePluginFn,
        library: Option<Rc<Library>>,
    ) -> Self {
        Self {
            inner: Inner::Foreign {
                raw,
                delete,
                _library: library,
            },
        }
    }

    /// Whether the instance came from a library entry point.
    #[must_use]
    pub fn is_foreign(&self) -> bool {
        matches!(self.inner, Inner::Foreign { .. })
    }
}

impl<P: ?Sized + 'static> Deref for PluginBox<P> {
    type Target = P;

    fn deref(&self) -> &P {
        match &self.inner {
            Inner::Owned(plugin) => &**plugin,
            // SAFETY: `raw` stays valid until `drop` hands it back.
            Inner::Foreign { raw, .. } => unsafe { &**raw.as_ref() },
        }
    }
}

impl<P: ?Sized + 'static> Drop for PluginBox<P> {
    fn drop(&mut self) {
        if let Inner::Foreign { raw, delete, .. } = &self.inner {
            // SAFETY: the instance is released exactly once, while its
            // library is still loaded.
            unsafe { delete(raw.as_ptr().cast()) };
        }
    }
}

impl<P: ?Sized + 'static> fmt::Debug for PluginBox<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginBox")
            .field("foreign", &self.is_foreign())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Shape {}

    impl PluginInterface for dyn Shape {
        const TYPE: &'static str = "Shape";
        const MAJOR_VERSION: u64 = 1;
    }

    #[test]
    fn minor_and_revision_are_informational() {
        let info = PluginInfo::new("square", "Shape", 1, 7, 42);
        assert!(info.check_interface::<dyn Shape>().is_ok());
    }

    #[test]
    fn major_version_must_match() {
        let info = PluginInfo::new("square", "Shape", 2, 0, 0);
        assert!(matches!(
            info.check_interface::<dyn Shape>(),
            Err(PluginError::VersionMismatch {
                found: 2,
                expected: 1,
                ..
            })
        ));
    }

    #[test]
    fn type_is_case_sensitive() {
        let info = PluginInfo::new("square", "shape", 1, 0, 0);
        assert!(matches!(
            info.check_interface::<dyn Shape>(),
            Err(PluginError::TypeMismatch { .. })
        ));
    }
}
