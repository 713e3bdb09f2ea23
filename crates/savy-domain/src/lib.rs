//! savy-domain
//!
//! Pure domain models (LedgerSnapshot, Movement, SavingsGoal).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod common;
pub mod goal;
pub mod movement;
pub mod snapshot;

pub use common::*;
pub use goal::*;
pub use movement::*;
pub use snapshot::*;
