// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Handle to one mapped component artifact.
//!
//! A loader tracks two independent counts under two independent mutexes:
//! how many times the artifact was opened (`load_library`/`unload_library`
//! pair up) and how many objects constructed from it are still alive. The
//! artifact is physically mapped iff the open count is above zero, with one
//! exception: an unload while objects are alive is diagnosed and skipped,
//! so code is never pulled out from under a live object. Each [`ClassObj`]
//! additionally pins the mapping with a shared `Library` handle, making the
//! skip rule safe even against misuse.

use libloading::{Library, Symbol};
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::registry;
use super::{RegisterClassesFn, Registrar};
use crate::config::REGISTER_CLASSES_SYMBOL;

/// Handle to a single artifact file.
pub struct ClassLoader {
    library_path: PathBuf,
    library: Mutex<Option<Arc<Library>>>,
    loadlib_ref_count: Mutex<i32>,
    classobj_ref_count: Arc<Mutex<i32>>,
}

impl ClassLoader {
    /// Create an unloaded handle for `library_path`.
    pub fn new(library_path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: library_path.into(),
            library: Mutex::new(None),
            loadlib_ref_count: Mutex::new(0),
            classobj_ref_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn library_path(&self) -> &Path {
        &self.library_path
    }

    /// True while the artifact-open count is above zero.
    pub fn is_library_loaded(&self) -> bool {
        *self
            .loadlib_ref_count
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            > 0
    }

    /// Open the artifact.
    ///
    /// The first successful call maps the artifact and runs its exported
    /// registration entry point with a [`Registrar`] bound to this path;
    /// every call after that only increments the open count. A mapping or
    /// symbol failure is warned and leaves the count untouched.
    pub fn load_library(&self) -> bool {
        let mut count = self
            .loadlib_ref_count
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if *count == 0 {
            // SAFETY: mapping an artifact runs its initialisers; artifacts
            // are trusted components of the deployed system.
            let library = match unsafe { Library::new(&self.library_path) } {
                Ok(library) => Arc::new(library),
                Err(e) => {
                    log::warn!(
                        "[ClassLoader::load_library] could not open {}: {}",
                        self.library_path.display(),
                        e
                    );
                    return false;
                }
            };
            {
                // SAFETY: the symbol type is the crate's published
                // entry-point signature; both sides are built against the
                // same definition.
                let entry: Symbol<'_, RegisterClassesFn> =
                    match unsafe { library.get(REGISTER_CLASSES_SYMBOL) } {
                        Ok(entry) => entry,
                        Err(e) => {
                            log::warn!(
                                "[ClassLoader::load_library] {} has no registration entry point: {}",
                                self.library_path.display(),
                                e
                            );
                            return false;
                        }
                    };
                let mut registrar = Registrar::new(self.library_path.clone());
                // SAFETY: entry point contract as above; the registrar
                // outlives the call.
                unsafe { entry(&mut registrar) };
            }
            *self.library.lock().unwrap_or_else(|e| e.into_inner()) = Some(library);
            log::info!(
                "[ClassLoader::load_library] {} mapped and registered",
                self.library_path.display()
            );
        }
        *count += 1;
        true
    }

    /// Close the artifact.
    ///
    /// While objects constructed from it are still alive the call is logged
    /// and skipped entirely (count unchanged, artifact stays mapped).
    /// Otherwise the count drops; reaching zero removes this loader's
    /// registrations and unmaps. Returns the open count after the call.
    pub fn unload_library(&self) -> i32 {
        let mut count = self
            .loadlib_ref_count
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        {
            let live = self
                .classobj_ref_count
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if *live > 0 {
                log::info!(
                    "[ClassLoader::unload_library] {} live objects from {}; keeping it mapped",
                    live,
                    self.library_path.display()
                );
                return *count;
            }
        }
        if *count > 0 {
            *count -= 1;
        } else {
            log::warn!(
                "[ClassLoader::unload_library] {} is not loaded",
                self.library_path.display()
            );
        }
        if *count == 0 {
            registry::instance().remove_owner(&self.library_path);
            *self.library.lock().unwrap_or_else(|e| e.into_inner()) = None;
            log::info!(
                "[ClassLoader::unload_library] {} unmapped",
                self.library_path.display()
            );
        }
        *count
    }

    /// Construct `class_name` (registered from this artifact) as a shared
    /// handle counted against this loader.
    ///
    /// Loads the artifact first if needed. Unknown names warn and yield
    /// `None`.
    pub fn create_class_obj<B: ?Sized + 'static>(&self, class_name: &str) -> Option<ClassObj<B>> {
        if !self.is_library_loaded() && !self.load_library() {
            return None;
        }

        let obj = registry::instance().create::<B>(class_name, Some(&self.library_path));
        let obj = match obj {
            Some(obj) => obj,
            None => {
                log::warn!(
                    "[ClassLoader::create_class_obj] failed, ensure class has been registered. \
                     class: {}, library: {}",
                    class_name,
                    self.library_path.display()
                );
                return None;
            }
        };

        {
            let mut live = self
                .classobj_ref_count
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            *live += 1;
        }
        let keepalive = self
            .library
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        Some(ClassObj {
            obj,
            live: Arc::clone(&self.classobj_ref_count),
            _keepalive: keepalive,
        })
    }

    /// Objects constructed from this artifact that are still alive.
    pub fn class_obj_count(&self) -> i32 {
        *self
            .classobj_ref_count
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Names registered under base `B` from this artifact.
    pub fn get_valid_class_names<B: ?Sized + 'static>(&self) -> Vec<String> {
        registry::instance().class_names::<B>(Some(&self.library_path))
    }

    /// True when `class_name` was registered under base `B` from this
    /// artifact.
    pub fn is_class_valid<B: ?Sized + 'static>(&self, class_name: &str) -> bool {
        registry::instance().is_class_valid::<B>(class_name, Some(&self.library_path))
    }

    /// Test seam: a loader that behaves as loaded without mapping anything.
    /// Registrations are installed by the test through a path-bound
    /// [`Registrar`].
    #[cfg(test)]
    pub(crate) fn new_preloaded(library_path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: library_path.into(),
            library: Mutex::new(None),
            loadlib_ref_count: Mutex::new(1),
            classobj_ref_count: Arc::new(Mutex::new(0)),
        }
    }
}

impl Drop for ClassLoader {
    fn drop(&mut self) {
        let live = *self
            .classobj_ref_count
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if live > 0 {
            log::error!(
                "[ClassLoader::drop] loader for {} destroyed with {} live objects",
                self.library_path.display(),
                live
            );
        }
    }
}

/// Shared-ownership handle to an object produced by a loader.
///
/// Dropping the handle destroys the object, decrements the loader's
/// live-object count, and releases the mapping pin.
pub struct ClassObj<B: ?Sized> {
    // Field order matters: the object must drop before the mapping pin.
    obj: Box<B>,
    live: Arc<Mutex<i32>>,
    _keepalive: Option<Arc<Library>>,
}

impl<B: ?Sized> Deref for ClassObj<B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.obj
    }
}

impl<B: ?Sized> DerefMut for ClassObj<B> {
    fn deref_mut(&mut self) -> &mut B {
        &mut self.obj
    }
}

impl<B: ?Sized> Drop for ClassObj<B> {
    fn drop(&mut self) {
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        *live -= 1;
    }
}
