#![doc(test(attr(deny(warnings))))]

//! Savy is a personal budgeting ledger: available cash, savings goals and the
//! movement history that explains both, persisted as a single JSON snapshot.
//!
//! The engine lives in `savy-core`; this crate wires it to the filesystem
//! store, user configuration and the `savy_cli` shell.

pub mod cli;
pub mod utils;

pub use savy_config::{Config, ConfigManager};
pub use savy_core::{CoreError, LedgerEngine};
pub use savy_domain::{LedgerSnapshot, Movement, MovementKind, SavingsGoal};
pub use savy_storage_json::JsonFileStore;

/// Default filter directive applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "savy=info";

/// Initializes global tracing with the default filter.
pub fn init() {
    init_with_filter(DEFAULT_LOG_FILTER);
}

/// Initializes global tracing, falling back to `directive` when `RUST_LOG` is unset.
/// Only the first call has any effect.
pub fn init_with_filter(directive: &str) {
    if utils::init_tracing(directive) {
        tracing::info!("Savy tracing initialized.");
    }
}
