//! Per-user palette cache on the local filesystem.
//!
//! Holds the full list as one JSON array under a single key file. This is the
//! last stage of the cascade and is always available.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{BoxFuture, LoadOutcome, SaveOutcome, StageKind, StorageError, StorageStage};
use crate::color::ColorEntry;

/// Storage key; the palette lives in `<key>.json` inside the data directory.
pub const STORAGE_KEY: &str = "colorShowcaseColors";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PALETTE_DATA_DIR";

/// Default data directory (`$XDG_DATA_HOME/palette-showcase` or platform equivalent).
pub fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::data_dir().context("Unable to determine data directory")?;
    Ok(base.join("palette-showcase"))
}

/// Local key-value stage.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored list, or `None` when nothing has been saved on this machine.
    pub fn read(&self) -> Result<Option<Vec<ColorEntry>>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Replace the stored list. The file is swapped in atomically.
    pub fn write(&self, colors: &[ColorEntry]) -> Result<(), StorageError> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| StorageError::Parse("storage path has no parent".into()))?;
        fs::create_dir_all(dir)?;

        let json = serde_json::to_string(colors)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;
        debug!(path = %self.path.display(), "Wrote local palette");
        Ok(())
    }
}

impl StorageStage for LocalStore {
    fn kind(&self) -> StageKind {
        StageKind::Local
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn try_load(&self) -> BoxFuture<'_, LoadOutcome> {
        Box::pin(async move {
            match self.read() {
                Ok(Some(colors)) => LoadOutcome::Loaded(colors),
                Ok(None) => LoadOutcome::Empty,
                Err(err) => LoadOutcome::Failed(err),
            }
        })
    }

    fn try_save<'a>(&'a self, colors: &'a [ColorEntry]) -> BoxFuture<'a, SaveOutcome> {
        Box::pin(async move {
            match self.write(colors) {
                Ok(()) => SaveOutcome::Saved,
                Err(err) => SaveOutcome::Failed(err),
            }
        })
    }
}
