use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

use crate::{Config, ConfigError};

const CONFIG_FILE_NAME: &str = "config.json";
const REJECTED_SUFFIX: &str = "bad";
const TMP_SUFFIX: &str = "tmp";

/// Reads and writes the preferences file.
///
/// Loading never fails on content: an unreadable file is moved aside to
/// `config.json.bad` and defaults are used, and a field holding the wrong type
/// falls back to its own default. Only filesystem errors surface.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(&base).map_err(ConfigError::io(&base))?;
        Ok(Self::new(base.join(CONFIG_FILE_NAME)))
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Where an unreadable preferences file is kept for inspection.
    pub fn rejected_path(&self) -> PathBuf {
        sibling(&self.config_path, REJECTED_SUFFIX)
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        let data = match fs::read(&self.config_path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(err) => return Err(ConfigError::io(&self.config_path)(err)),
        };

        match serde_json::from_slice::<Value>(&data) {
            Ok(Value::Object(fields)) => Ok(decode_config(&fields)),
            Ok(_) => self.reject("top-level value is not an object"),
            Err(err) => self.reject(&err.to_string()),
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::io(parent))?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = sibling(&self.config_path, TMP_SUFFIX);
        write_synced(&tmp, json.as_bytes()).map_err(ConfigError::io(&tmp))?;
        fs::rename(&tmp, &self.config_path).map_err(ConfigError::io(&self.config_path))?;
        tracing::debug!(path = %self.config_path.display(), "preferences saved");
        Ok(())
    }

    fn reject(&self, reason: &str) -> Result<Config, ConfigError> {
        let rejected = self.rejected_path();
        fs::rename(&self.config_path, &rejected).map_err(ConfigError::io(&rejected))?;
        tracing::warn!(
            path = %self.config_path.display(),
            moved_to = %rejected.display(),
            reason,
            "unreadable preferences, using defaults"
        );
        Ok(Config::default())
    }
}

fn decode_config(fields: &Map<String, Value>) -> Config {
    let mut config = Config::default();
    for (key, value) in fields {
        let accepted = match key.as_str() {
            "currency" => assign(value.as_str(), |v| config.currency = v.to_string()),
            "locale" => assign(value.as_str(), |v| config.locale = v.to_string()),
            "log_filter" => assign(value.as_str(), |v| config.log_filter = v.to_string()),
            "ui_color_enabled" => assign(value.as_bool(), |v| config.ui_color_enabled = v),
            "data_dir" => match value {
                Value::Null => true,
                Value::String(path) => {
                    config.data_dir = Some(PathBuf::from(path));
                    true
                }
                _ => false,
            },
            _ => {
                tracing::debug!(key = key.as_str(), "ignoring unknown preference");
                true
            }
        };
        if !accepted {
            tracing::warn!(key = key.as_str(), "preference has the wrong type, using its default");
        }
    }
    config
}

fn assign<T>(value: Option<T>, set: impl FnOnce(T)) -> bool {
    value.map(set).is_some()
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut sibling = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, suffix),
        None => suffix.to_string(),
    };
    sibling.set_extension(ext);
    sibling
}

fn write_synced(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()
}
