// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Graph loading and module lifecycle control.
//!
//! The hosting process points the controller at one or more graph
//! description files; the controller maps every referenced artifact,
//! instantiates the listed components by class name, drives their
//! initialize sequence and retains them (plus the timers of timer-driven
//! components) until teardown.

mod dag;
mod module_argument;
mod module_controller;

pub use dag::{ComponentEntry, DagConfig, ModuleConfig, TimerComponentEntry};
pub use module_argument::ModuleArgument;
pub use module_controller::ModuleController;
