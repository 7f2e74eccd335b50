// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! axon hosting process.
//!
//! Loads one or more component graphs, keeps the hosted components running
//! until interrupted, then tears everything down in order.
//!
//! # Usage
//!
//! ```bash
//! mainboard --dag_conf perception.json --dag_conf planning.json
//! mainboard --dag_conf graph.json --plugin lib/libextra_components.so
//! ```

use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axon::mainboard::{ModuleArgument, ModuleController};

/// axon component hosting process
#[derive(Parser, Debug)]
#[command(name = "mainboard")]
#[command(about = "axon component hosting process")]
#[command(version)]
struct Args {
    /// Graph description file to load (repeatable)
    #[arg(long = "dag_conf", required = true)]
    dag_conf: Vec<String>,

    /// Process group this mainboard belongs to
    #[arg(long = "process_group", default_value = "mainboard_default")]
    process_group: String,

    /// Scheduling policy name handed to the external scheduler
    #[arg(long = "sched_name", default_value = "classic")]
    sched_name: String,

    /// Extra artifact to map before the graphs are loaded (repeatable)
    #[arg(long = "plugin")]
    plugin: Vec<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let module_args = ModuleArgument {
        dag_conf_list: args.dag_conf,
        process_group: args.process_group,
        sched_name: args.sched_name,
        plugin_list: args.plugin,
    };
    log::info!(
        "[mainboard] starting, group {}, policy {}",
        module_args.process_group,
        module_args.sched_name
    );

    let mut controller = ModuleController::new(module_args);
    if let Err(e) = controller.init() {
        log::error!("[mainboard] module load failed: {}", e);
        controller.clear();
        std::process::exit(1);
    }
    log::info!(
        "[mainboard] {} components running{}",
        controller.component_num(),
        if controller.has_timer_component() {
            " (timer-driven components keep the process alive)"
        } else {
            ""
        }
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        log::warn!("[mainboard] no interrupt handler: {}", e);
    }

    while running.load(Ordering::SeqCst) && axon::state::ok() {
        std::thread::sleep(Duration::from_millis(200));
    }

    log::info!("[mainboard] shutting down");
    controller.clear();
    axon::shutdown();
}
