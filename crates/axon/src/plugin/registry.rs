// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide class registry.
//!
//! Two-level mapping from a base type to the concrete classes registered
//! under it. Entries capture a typed constructor thunk plus the set of
//! artifacts that own the registration; an entry disappears when its last
//! owner is unloaded.
//!
//! Duplicate registration of a `(base, name)` pair keeps the first entry
//! and warns on the second, whichever artifact it came from.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// Typed constructor wrapper stored behind `Any`.
struct FactoryFn<B: ?Sized>(Arc<dyn Fn() -> Box<B> + Send + Sync>);

/// One registered class: names, owners and the constructor thunk.
pub struct ClassFactory {
    class_name: String,
    base_name: &'static str,
    relative_library_path: PathBuf,
    owners: Vec<PathBuf>,
    ctor: Box<dyn Any + Send + Sync>,
}

impl ClassFactory {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn base_name(&self) -> &'static str {
        self.base_name
    }

    pub fn relative_library_path(&self) -> &Path {
        &self.relative_library_path
    }

    pub fn is_owned_by(&self, library_path: &Path) -> bool {
        self.owners.iter().any(|p| p == library_path)
    }
}

/// Process-wide registry of loadable classes.
#[derive(Default)]
pub struct ClassRegistry {
    factories: Mutex<HashMap<TypeId, HashMap<String, ClassFactory>>>,
}

static REGISTRY: OnceLock<ClassRegistry> = OnceLock::new();

/// The process-wide registry instance.
pub fn instance() -> &'static ClassRegistry {
    REGISTRY.get_or_init(ClassRegistry::default)
}

impl ClassRegistry {
    pub(crate) fn register<B: ?Sized + 'static>(
        &self,
        class_name: &str,
        library_path: &Path,
        ctor: Arc<dyn Fn() -> Box<B> + Send + Sync>,
    ) {
        let mut factories = self.factories.lock().unwrap_or_else(|e| e.into_inner());
        let classes = factories.entry(TypeId::of::<B>()).or_default();

        if let Some(existing) = classes.get(class_name) {
            log::warn!(
                "[ClassRegistry::register] class {} already registered from {}; \
                 keeping the first registration",
                class_name,
                existing.relative_library_path.display()
            );
            return;
        }

        classes.insert(
            class_name.to_string(),
            ClassFactory {
                class_name: class_name.to_string(),
                base_name: std::any::type_name::<B>(),
                relative_library_path: library_path.to_path_buf(),
                owners: vec![library_path.to_path_buf()],
                ctor: Box::new(FactoryFn(ctor)),
            },
        );
        log::debug!(
            "[ClassRegistry::register] {} registered under {} from {}",
            class_name,
            std::any::type_name::<B>(),
            library_path.display()
        );
    }

    /// Construct an instance of `class_name` as a `Box<B>`.
    ///
    /// With `owner` set, only an entry owned by that artifact matches. The
    /// registry lock is released before the constructor runs.
    pub fn create<B: ?Sized + 'static>(
        &self,
        class_name: &str,
        owner: Option<&Path>,
    ) -> Option<Box<B>> {
        let ctor = {
            let factories = self.factories.lock().unwrap_or_else(|e| e.into_inner());
            let entry = factories.get(&TypeId::of::<B>())?.get(class_name)?;
            if let Some(owner) = owner {
                if !entry.is_owned_by(owner) {
                    return None;
                }
            }
            let factory = entry.ctor.downcast_ref::<FactoryFn<B>>()?;
            Arc::clone(&factory.0)
        };
        Some(ctor())
    }

    /// Names registered under base `B`, optionally restricted to one owner.
    pub fn class_names<B: ?Sized + 'static>(&self, owner: Option<&Path>) -> Vec<String> {
        let factories = self.factories.lock().unwrap_or_else(|e| e.into_inner());
        match factories.get(&TypeId::of::<B>()) {
            Some(classes) => classes
                .values()
                .filter(|f| owner.is_none_or(|p| f.is_owned_by(p)))
                .map(|f| f.class_name.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    /// True when `class_name` is registered under base `B` (for `owner`, if
    /// given).
    pub fn is_class_valid<B: ?Sized + 'static>(
        &self,
        class_name: &str,
        owner: Option<&Path>,
    ) -> bool {
        let factories = self.factories.lock().unwrap_or_else(|e| e.into_inner());
        factories
            .get(&TypeId::of::<B>())
            .and_then(|classes| classes.get(class_name))
            .map(|f| owner.is_none_or(|p| f.is_owned_by(p)))
            .unwrap_or(false)
    }

    /// Remove `library_path` from every entry's owner set and drop entries
    /// left with no owner. Called when an artifact is unmapped.
    pub(crate) fn remove_owner(&self, library_path: &Path) {
        let mut factories = self.factories.lock().unwrap_or_else(|e| e.into_inner());
        for classes in factories.values_mut() {
            classes.retain(|name, factory| {
                factory.owners.retain(|p| p != library_path);
                if factory.owners.is_empty() {
                    log::debug!(
                        "[ClassRegistry::remove_owner] {} dropped with its last owner {}",
                        name,
                        library_path.display()
                    );
                    false
                } else {
                    true
                }
            });
        }
    }
}

/// Handed to an artifact's registration entry point; binds every
/// registration to the artifact being loaded.
///
/// Carries a reference to the loading process's registry. An artifact is a
/// separate compilation with statics of its own, so registrations must go
/// through this reference rather than the artifact's view of the global.
pub struct Registrar {
    registry: &'static ClassRegistry,
    library_path: PathBuf,
}

impl Registrar {
    pub(crate) fn new(library_path: PathBuf) -> Self {
        Self {
            registry: instance(),
            library_path,
        }
    }

    /// Path of the artifact currently registering.
    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// Register `class_name` under base `B` with its constructor thunk.
    pub fn register_class<B: ?Sized + 'static, F>(&mut self, class_name: &str, ctor: F)
    where
        F: Fn() -> Box<B> + Send + Sync + 'static,
    {
        self.registry
            .register::<B>(class_name, &self.library_path, Arc::new(ctor));
    }
}

/// Signature of the entry point every component artifact exports.
pub type RegisterClassesFn = unsafe extern "C" fn(*mut Registrar);
