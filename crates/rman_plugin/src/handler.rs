//! Name based plugin resolution.

use std::rc::Rc;

use log::debug;
use rustc_hash::FxHashMap;

use crate::errors::PluginError;
use crate::factory::{LibraryFactory, PluginFactory, PluginRef};
use crate::plugin::PluginInterface;
use crate::search_path::SearchPath;

/// Resolves plugin names of interface `P` to factories and instances.
///
/// Lookup order: factories registered by the host, then libraries loaded
/// earlier, then a library named after the plugin found on the search path.
pub struct PluginHandler<P: PluginInterface + ?Sized + 'static> {
    registered: FxHashMap<String, Box<dyn PluginFactory<P>>>,
    loaded: FxHashMap<String, Box<dyn PluginFactory<P>>>,
    last: FxHashMap<String, PluginRef<P>>,
    search_path: SearchPath,
}

impl<P: PluginInterface + ?Sized + 'static> PluginHandler<P> {
    #[must_use]
    pub fn new(search_path: SearchPath) -> Self {
        Self {
            registered: FxHashMap::default(),
            loaded: FxHashMap::default(),
            last: FxHashMap::default(),
            search_path,
        }
    }

    #[must_use]
    pub fn search_path(&self) -> &SearchPath {
        &self.search_path
    }

    /// Replaces the search path; libraries already loaded stay cached.
    pub fn set_search_path(&mut self, path: SearchPath) {
        debug!("{} search path: {path}", P::TYPE);
        self.search_path = path;
    }

    /// Registers a host-provided factory under its reported name, replacing
    /// an earlier registration of that name.
    pub fn register(&mut self, factory: Box<dyn PluginFactory<P>>) -> Result<(), PluginError> {
        factory.info().check_interface::<P>()?;
        let name = factory.info().name.clone();
        debug!("Registered {} factory \"{name}\"", P::TYPE);
        self.last.remove(&name);
        self.registered.insert(name, factory);
        Ok(())
    }

    /// Whether `name` resolves without touching the file system.
    #[must_use]
    pub fn is_known(&self, name: &str) -> bool {
        self.registered.contains_key(name) || self.loaded.contains_key(name)
    }

    /// The factory for `name`, loading its library on first use.
    pub fn factory(&mut self, name: &str) -> Result<&mut Box<dyn PluginFactory<P>>, PluginError> {
        if !self.is_known(name) {
            let path = self
                .search_path
                .find_library(name)
                .ok_or_else(|| PluginError::NotFound {
                    name: name.to_owned(),
                })?;
            let factory = LibraryFactory::<P>::load(&path, name)?;
            self.loaded.insert(name.to_owned(), Box::new(factory));
        }
        match self.registered.get_mut(name) {
            Some(factory) => Ok(factory),
            None => self.loaded.get_mut(name).ok_or_else(|| PluginError::NotFound {
                name: name.to_owned(),
            }),
        }
    }

    /// A fresh instance of plugin `name`.
    pub fn new_plugin(&mut self, name: &str) -> Result<PluginRef<P>, PluginError> {
        self.factory(name)?.new_plugin(P::MAJOR_VERSION, P::TYPE)
    }

    /// The cached instance of plugin `name`, created on first use.
    pub fn last_plugin(&mut self, name: &str) -> Result<PluginRef<P>, PluginError> {
        if let Some(plugin) = self.last.get(name) {
            return Ok(Rc::clone(plugin));
        }
        let plugin = self.new_plugin(name)?;
        self.last.insert(name.to_owned(), Rc::clone(&plugin));
        Ok(plugin)
    }

    /// Forgets an instance created for `name`.
    pub fn delete_plugin(&mut self, name: &str, plugin: &PluginRef<P>) -> bool {
        if self
            .last
            .get(name)
            .is_some_and(|last| Rc::ptr_eq(last, plugin))
        {
            self.last.remove(name);
        }
        let factory = match self.registered.get_mut(name) {
            Some(factory) => factory,
            None => match self.loaded.get_mut(name) {
                Some(factory) => factory,
                None => return false,
            },
        };
        factory.delete_plugin(plugin)
    }

    /// Drops a loaded library together with every instance it created.
    pub fn unload(&mut self, name: &str) -> bool {
        self.last.remove(name);
        self.loaded.remove(name).is_some()
    }
}

impl<P: PluginInterface + ?Sized + 'static> Default for PluginHandler<P> {
    fn default() -> Self {
        Self::new(SearchPath::default_path())
    }
}

impl<P: PluginInterface + ?Sized + 'static> Drop for PluginHandler<P> {
    fn drop(&mut self) {
        // instances before the factories that own their libraries
        self.last.clear();
        self.registered.clear();
        self.loaded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::MemoryFactory;
    use crate::plugin::PluginInfo;
    use std::path::PathBuf;

    trait Backend {
        fn id(&self) -> u32;
    }

    impl PluginInterface for dyn Backend {
        const TYPE: &'static str = "Backend";
        const MAJOR_VERSION: u64 = 1;
    }

    struct Fixed(u32);

    impl Backend for Fixed {
        fn id(&self) -> u32 {
            self.0
        }
    }

    fn handler() -> PluginHandler<dyn Backend> {
        let mut handler = PluginHandler::new(SearchPath::from_entries(vec![PathBuf::from(
            "/nonexistent",
        )]));
        let factory = MemoryFactory::<dyn Backend>::new(
            PluginInfo::for_interface::<dyn Backend>("ribwriter", 2, 5),
            || Box::new(Fixed(7)),
        )
        .unwrap();
        handler.register(Box::new(factory)).unwrap();
        handler
    }

    #[test]
    fn last_plugin_returns_the_same_instance() {
        let mut handler = handler();
        let a = handler.last_plugin("ribwriter").unwrap();
        let b = handler.last_plugin("ribwriter").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.id(), 7);
        assert_eq!(handler.factory("ribwriter").unwrap().instance_count(), 1);
    }

    #[test]
    fn new_plugin_always_creates() {
        let mut handler = handler();
        let a = handler.new_plugin("ribwriter").unwrap();
        let b = handler.new_plugin("ribwriter").unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
        assert!(handler.delete_plugin("ribwriter", &a));
        assert_eq!(handler.factory("ribwriter").unwrap().instance_count(), 1);
    }

    #[test]
    fn deleting_the_last_instance_forgets_it() {
        let mut handler = handler();
        let a = handler.last_plugin("ribwriter").unwrap();
        assert!(handler.delete_plugin("ribwriter", &a));
        let b = handler.last_plugin("ribwriter").unwrap();
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_plugin_is_not_found() {
        let mut handler = handler();
        let err = handler.last_plugin("opengl").err().unwrap();
        assert_eq!(err, PluginError::NotFound { name: "opengl".into() });
    }

    #[test]
    fn only_matching_factories_register() {
        let mut handler = handler();
        let factory = MemoryFactory::<dyn Backend>::new(
            PluginInfo::for_interface::<dyn Backend>("null", 0, 0),
            || Box::new(Fixed(0)),
        )
        .unwrap();
        assert!(handler.register(Box::new(factory)).is_ok());

        assert!(
            MemoryFactory::<dyn Backend>::new(PluginInfo::new("v2", "Backend", 2, 0, 0), || {
                Box::new(Fixed(2))
            })
            .is_err()
        );
    }
}
