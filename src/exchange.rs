//! Palette import and export files.
//!
//! Export files carry the list plus an `exportedAt` timestamp and schema
//! version. Import only requires a top-level `colors` array; any other
//! metadata is ignored.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::color::ColorEntry;
use crate::storage::github::DOCUMENT_VERSION;

/// Errors surfaced to the user when an import is rejected.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read import file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error importing colors. Please check the file format: {0}")]
    InvalidJson(String),

    #[error("Invalid color file format: expected an object with a `colors` array")]
    InvalidFormat,

    #[error("Invalid color file: duplicate color id '{0}'")]
    DuplicateId(String),
}

/// Contents of an export file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub colors: Vec<ColorEntry>,
    pub exported_at: String,
    pub version: String,
}

impl ExportDocument {
    pub fn new(colors: &[ColorEntry], exported_at: DateTime<Utc>) -> Self {
        Self {
            colors: colors.to_vec(),
            exported_at: exported_at.to_rfc3339(),
            version: DOCUMENT_VERSION.to_string(),
        }
    }
}

/// `color-palette-YYYY-MM-DD.json`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("color-palette-{}.json", date.format("%Y-%m-%d"))
}

/// Write the palette into `dir` and return the created file path.
pub fn export_palette(colors: &[ColorEntry], dir: &Path) -> anyhow::Result<PathBuf> {
    use anyhow::Context;

    let now = Utc::now();
    let document = ExportDocument::new(colors, now);
    let path = dir.join(export_file_name(now.date_naive()));
    let json = serde_json::to_string_pretty(&document).context("Failed to serialize palette")?;

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), count = colors.len(), "Exported palette");
    Ok(path)
}

/// Parse import file contents. The shape is checked and ids must be unique.
pub fn parse_import(content: &str) -> Result<Vec<ColorEntry>, ImportError> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ImportError::InvalidJson(e.to_string()))?;

    let colors = value
        .get("colors")
        .filter(|colors| colors.is_array())
        .cloned()
        .ok_or(ImportError::InvalidFormat)?;

    let colors: Vec<ColorEntry> =
        serde_json::from_value(colors).map_err(|e| ImportError::InvalidJson(e.to_string()))?;

    let duplicate = {
        let mut seen = HashSet::new();
        colors.iter().find(|c| !seen.insert(c.id.as_str())).map(|c| c.id.clone())
    };
    match duplicate {
        Some(id) => Err(ImportError::DuplicateId(id)),
        None => Ok(colors),
    }
}

pub fn read_import(path: &Path) -> Result<Vec<ColorEntry>, ImportError> {
    let content = fs::read_to_string(path)?;
    parse_import(&content)
}
