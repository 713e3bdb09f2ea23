//! savy-core
//!
//! Ledger engine, derived queries, and the persistence capability for Savy.
//! Depends on savy-domain. No terminal I/O; durable stores live in sibling crates.

pub mod cash_service;
pub mod engine;
pub mod error;
pub mod goal_service;
pub mod notify;
pub mod persistence;
pub mod storage;
pub mod summary_service;
pub mod time;
mod validation;

#[cfg(test)]
mod tests;

pub use cash_service::*;
pub use engine::*;
pub use error::CoreError;
pub use goal_service::*;
pub use notify::*;
pub use persistence::*;
pub use storage::*;
pub use summary_service::*;
pub use time::*;
