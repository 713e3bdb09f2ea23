use std::{ffi::OsString, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the data directory.
pub const SAVY_HOME_ENV: &str = "SAVY_HOME";

const DATA_DIR_NAME: &str = "savy";
const FALLBACK_DATA_DIR: &str = ".savy";

/// Display preferences and storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub currency: String,
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub log_filter: String,
    pub ui_color_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "COP".into(),
            locale: "es-CO".into(),
            data_dir: None,
            log_filter: Self::default_log_filter(),
            ui_color_enabled: true,
        }
    }
}

impl Config {
    pub fn default_log_filter() -> String {
        "savy=info".into()
    }

    /// Directory holding the ledger snapshot: the configured `data_dir`, then
    /// `$SAVY_HOME`, then the platform data directory, then `./.savy`.
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.resolve_data_dir_from(std::env::var_os(SAVY_HOME_ENV))
    }

    pub fn resolve_data_dir_from(&self, savy_home: Option<OsString>) -> PathBuf {
        if let Some(path) = &self.data_dir {
            return path.clone();
        }
        if let Some(home) = savy_home.filter(|value| !value.is_empty()) {
            return PathBuf::from(home);
        }
        dirs::data_dir()
            .map(|base| base.join(DATA_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_DATA_DIR))
    }
}
