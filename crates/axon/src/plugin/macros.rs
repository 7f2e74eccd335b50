// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registration macro for component artifacts.

/// Export the registration entry point of a component artifact.
///
/// Invoke once per artifact, listing every component class it provides.
/// The expansion defines the `axon_register_classes` symbol the class
/// loader resolves right after mapping the artifact; when called it
/// registers each listed class under the `ComponentBase` base with a
/// `Default`-based constructor.
///
/// ```ignore
/// use axon::register_components;
///
/// #[derive(Default)]
/// pub struct LidarDriver { /* ... */ }
/// // impl axon::component::ComponentBase for LidarDriver { ... }
///
/// register_components!(LidarDriver);
/// ```
#[macro_export]
macro_rules! register_components {
    ($($component:ty),+ $(,)?) => {
        /// Registration entry point resolved by the class loader.
        ///
        /// # Safety
        /// Called by the loader with a valid, exclusive `Registrar` pointer
        /// immediately after this artifact is mapped.
        #[no_mangle]
        pub unsafe extern "C" fn axon_register_classes(
            registrar: *mut $crate::plugin::Registrar,
        ) {
            let registrar = &mut *registrar;
            $(
                registrar.register_class::<dyn $crate::component::ComponentBase, _>(
                    stringify!($component),
                    || -> Box<dyn $crate::component::ComponentBase> {
                        Box::new(<$component as Default>::default())
                    },
                );
            )+
        }
    };
}
