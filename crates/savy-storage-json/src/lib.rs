use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::Utc;
use savy_core::{storage::SnapshotStore, CoreError, SAVY_STORAGE_KEY};

const SNAPSHOT_EXTENSION: &str = "json";
const QUARANTINE_MARKER: &str = "corrupt";
const QUARANTINE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed snapshot store: one JSON document under the data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", SAVY_STORAGE_KEY, SNAPSHOT_EXTENSION))
    }

    /// Quarantined documents, oldest first.
    pub fn list_quarantined(&self) -> Result<Vec<PathBuf>, CoreError> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}.{}-", SAVY_STORAGE_KEY, QUARANTINE_MARKER);
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(&prefix))
                .unwrap_or(false);
            if matches {
                entries.push(path);
            }
        }
        entries.sort();
        Ok(entries)
    }

    fn quarantine_path(&self) -> PathBuf {
        let timestamp = Utc::now().format(QUARANTINE_TIMESTAMP_FORMAT);
        let stem = format!("{}.{}-{}", SAVY_STORAGE_KEY, QUARANTINE_MARKER, timestamp);
        let mut path = self.data_dir.join(format!("{}.{}", stem, SNAPSHOT_EXTENSION));
        let mut attempt = 1;
        while path.exists() {
            path = self
                .data_dir
                .join(format!("{}-{}.{}", stem, attempt, SNAPSHOT_EXTENSION));
            attempt += 1;
        }
        path
    }
}

impl SnapshotStore for JsonFileStore {
    fn read(&self) -> Result<Option<Vec<u8>>, CoreError> {
        match fs::read(self.snapshot_path()) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, document: &str) -> Result<(), CoreError> {
        let path = self.snapshot_path();
        let tmp = tmp_path(&path);
        write_synced(&tmp, document.as_bytes())?;
        fs::rename(&tmp, &path)?;
        // Makes the rename itself durable.
        #[cfg(unix)]
        {
            if let Ok(dir) = File::open(&self.data_dir) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    fn quarantine(&self, document: &[u8]) -> Result<(), CoreError> {
        let path = self.quarantine_path();
        write_synced(&path, document)?;
        tracing::warn!(path = %path.display(), "unreadable snapshot quarantined");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes `data` and waits for it to reach the disk, so a rename that follows
/// never exposes a truncated document after a crash.
fn write_synced(path: &Path, data: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}
