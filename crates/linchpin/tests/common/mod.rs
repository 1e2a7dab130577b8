//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use linchpin::notify::BroadcastNotifier;
use linchpin::storage::{InMemoryEdgeStore, WorkItemCatalog};
use linchpin::{DependencyService, EngineConfig, WorkItem};
use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;

/// Build a service over an in-memory store with the given `(id, duration)` items.
pub fn service_with_items(items: &[(&str, u32)]) -> (DependencyService, BroadcastNotifier) {
    service_with_config(items, EngineConfig::default())
}

/// Like [`service_with_items`], with explicit engine settings.
pub fn service_with_config(
    items: &[(&str, u32)],
    config: EngineConfig,
) -> (DependencyService, BroadcastNotifier) {
    let catalog = WorkItemCatalog::with_items(
        items
            .iter()
            .map(|(id, duration)| WorkItem::new(*id, id.to_uppercase(), *duration)),
    );
    let notifier = BroadcastNotifier::from_config(&config).expect("default config is valid");
    let service = DependencyService::new(
        Arc::new(InMemoryEdgeStore::new()),
        Arc::new(catalog),
        Arc::new(notifier.clone()),
        config,
    )
    .expect("default config is valid");
    (service, notifier)
}

/// Run the linchpin binary in the specified directory
pub fn run_linchpin_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_linchpin"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute linchpin binary")
}
