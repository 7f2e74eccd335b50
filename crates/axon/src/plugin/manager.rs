// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Collection of class loaders with path deduplication.
//!
//! Loaders are kept in insertion order; a whole-process class lookup visits
//! them in that order and the first match wins.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{ClassLoader, ClassObj};

/// Owns one loader per referenced artifact path.
#[derive(Default)]
pub struct ClassLoaderManager {
    loaders: Mutex<Vec<Arc<ClassLoader>>>,
}

impl ClassLoaderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `library_path`, reusing the existing loader for an
    /// already-known path. Returns whether the artifact ends up loaded.
    pub fn load_library(&self, library_path: impl AsRef<Path>) -> bool {
        let library_path = library_path.as_ref();
        let loader = {
            let mut loaders = self.loaders.lock().unwrap_or_else(|e| e.into_inner());
            match loaders.iter().find(|l| l.library_path() == library_path) {
                Some(existing) => Arc::clone(existing),
                None => {
                    let loader = Arc::new(ClassLoader::new(library_path));
                    loaders.push(Arc::clone(&loader));
                    loader
                }
            }
        };
        loader.is_library_loaded() || loader.load_library()
    }

    /// Construct `class_name` as a `Box<B>`-holding handle.
    ///
    /// With `library_path` given, only that artifact is consulted (and
    /// opened on demand); otherwise every loader is searched in insertion
    /// order and the first owning one constructs the object.
    pub fn create_class_obj<B: ?Sized + 'static>(
        &self,
        class_name: &str,
        library_path: Option<&Path>,
    ) -> Option<ClassObj<B>> {
        if let Some(library_path) = library_path {
            if !self.load_library(library_path) {
                return None;
            }
            let loaders = self.loaders.lock().unwrap_or_else(|e| e.into_inner());
            let loader = loaders
                .iter()
                .find(|l| l.library_path() == library_path)
                .cloned();
            drop(loaders);
            return loader.and_then(|l| l.create_class_obj::<B>(class_name));
        }

        let loaders = {
            let guard = self.loaders.lock().unwrap_or_else(|e| e.into_inner());
            guard.clone()
        };
        for loader in loaders {
            if loader.is_class_valid::<B>(class_name) {
                return loader.create_class_obj::<B>(class_name);
            }
        }
        log::warn!(
            "[ClassLoaderManager::create_class_obj] no loader registers class {}",
            class_name
        );
        None
    }

    /// Union of the class names registered under base `B` across all
    /// loaders.
    pub fn get_valid_class_names<B: ?Sized + 'static>(&self) -> Vec<String> {
        let loaders = self.loaders.lock().unwrap_or_else(|e| e.into_inner());
        let mut names = Vec::new();
        for loader in loaders.iter() {
            names.extend(loader.get_valid_class_names::<B>());
        }
        names
    }

    /// Paths of the artifacts this manager knows about, in insertion order.
    pub fn library_paths(&self) -> Vec<PathBuf> {
        let loaders = self.loaders.lock().unwrap_or_else(|e| e.into_inner());
        loaders
            .iter()
            .map(|l| l.library_path().to_path_buf())
            .collect()
    }

    /// Close every loaded artifact (loaders with live objects skip, see
    /// [`ClassLoader::unload_library`]).
    pub fn unload_all_libraries(&self) {
        let loaders = {
            let guard = self.loaders.lock().unwrap_or_else(|e| e.into_inner());
            guard.clone()
        };
        for loader in loaders {
            if loader.is_library_loaded() {
                loader.unload_library();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Registrar;
    use std::path::PathBuf;

    trait Widget: Send {
        fn kind(&self) -> &'static str;
    }

    struct Knob;
    impl Widget for Knob {
        fn kind(&self) -> &'static str {
            "knob"
        }
    }

    struct Slider;
    impl Widget for Slider {
        fn kind(&self) -> &'static str {
            "slider"
        }
    }

    fn manager_with_preloaded(paths: &[&str]) -> ClassLoaderManager {
        let manager = ClassLoaderManager::new();
        {
            let mut loaders = manager.loaders.lock().unwrap_or_else(|e| e.into_inner());
            for path in paths {
                loaders.push(Arc::new(ClassLoader::new_preloaded(*path)));
            }
        }
        manager
    }

    #[test]
    fn missing_artifact_reports_unloaded() {
        let manager = ClassLoaderManager::new();
        assert!(!manager.load_library("/nonexistent/libnothing.so"));
        // The loader is still tracked so a later retry reuses it.
        assert_eq!(
            manager.library_paths(),
            vec![PathBuf::from("/nonexistent/libnothing.so")]
        );
    }

    #[test]
    fn search_order_is_insertion_order() {
        let manager = manager_with_preloaded(&["test://mgr_a.so", "test://mgr_b.so"]);
        let mut reg_a = Registrar::new(PathBuf::from("test://mgr_a.so"));
        reg_a.register_class::<dyn Widget, _>("OrderedWidget", || Box::new(Knob) as Box<dyn Widget>);
        // The registry keeps first-wins per (base, name); the manager search
        // must reach the first loader that owns the entry.
        let mut reg_b = Registrar::new(PathBuf::from("test://mgr_b.so"));
        reg_b.register_class::<dyn Widget, _>("OrderedWidget", || Box::new(Slider) as Box<dyn Widget>);

        let obj = manager.create_class_obj::<dyn Widget>("OrderedWidget", None);
        assert_eq!(obj.map(|w| w.kind()), Some("knob"));
    }

    #[test]
    fn unknown_class_yields_none() {
        let manager = manager_with_preloaded(&["test://mgr_empty.so"]);
        assert!(manager
            .create_class_obj::<dyn Widget>("GhostWidget", None)
            .is_none());
    }

    #[test]
    fn explicit_path_scopes_the_lookup_to_one_artifact() {
        let manager = manager_with_preloaded(&["test://mgr_scoped_a.so", "test://mgr_scoped_b.so"]);
        Registrar::new(PathBuf::from("test://mgr_scoped_a.so"))
            .register_class::<dyn Widget, _>("ScopedWidget", || Box::new(Knob) as Box<dyn Widget>);

        let hit = manager.create_class_obj::<dyn Widget>(
            "ScopedWidget",
            Some(Path::new("test://mgr_scoped_a.so")),
        );
        assert_eq!(hit.map(|w| w.kind()), Some("knob"));

        // The class exists, but not in the named artifact.
        assert!(manager
            .create_class_obj::<dyn Widget>("ScopedWidget", Some(Path::new("test://mgr_scoped_b.so")))
            .is_none());
    }

    #[test]
    fn explicit_path_does_not_reopen_a_loaded_artifact() {
        let manager = manager_with_preloaded(&["test://mgr_refcount.so"]);
        Registrar::new(PathBuf::from("test://mgr_refcount.so"))
            .register_class::<dyn Widget, _>("RefcountWidget", || Box::new(Slider) as Box<dyn Widget>);

        let obj = manager.create_class_obj::<dyn Widget>(
            "RefcountWidget",
            Some(Path::new("test://mgr_refcount.so")),
        );
        assert!(obj.is_some());
        drop(obj);

        // The open count is still the preloaded 1: a second open through the
        // explicit path would leave the artifact needing two unloads.
        let loader = {
            let loaders = manager.loaders.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(&loaders[0])
        };
        assert_eq!(loader.unload_library(), 0);
        assert!(!loader.is_library_loaded());
    }

    #[test]
    fn explicit_path_opens_the_artifact_on_demand() {
        let manager = ClassLoaderManager::new();
        assert!(manager
            .create_class_obj::<dyn Widget>(
                "AnyWidget",
                Some(Path::new("/nonexistent/libwidgets.so"))
            )
            .is_none());
        // The failed open is tracked for retry, like load_library.
        assert_eq!(
            manager.library_paths(),
            vec![PathBuf::from("/nonexistent/libwidgets.so")]
        );
    }

    #[test]
    fn names_union_spans_all_loaders() {
        let manager = manager_with_preloaded(&["test://mgr_u1.so", "test://mgr_u2.so"]);
        Registrar::new(PathBuf::from("test://mgr_u1.so"))
            .register_class::<dyn Widget, _>("UnionKnob", || Box::new(Knob) as Box<dyn Widget>);
        Registrar::new(PathBuf::from("test://mgr_u2.so"))
            .register_class::<dyn Widget, _>("UnionSlider", || Box::new(Slider) as Box<dyn Widget>);

        let mut names = manager.get_valid_class_names::<dyn Widget>();
        names.sort();
        assert_eq!(names, vec!["UnionKnob", "UnionSlider"]);
    }
}
