//! savy-config
//!
//! User preferences for the Savy tools and where they keep their data.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, SAVY_HOME_ENV};
