//! In-memory palette state and the rules for mutating it.
//!
//! Every mutation either returns a [`Change`] describing how the new list has
//! to be persisted, or `None` when the request was rejected. Rejections are
//! silent: nothing is mutated and nothing is saved.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::debug;

use crate::color::{default_palette, parse_hex, Category, ColorEntry};

/// Per-session UI state that influences how mutations are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    /// Admin mode is a convenience toggle for the UI, not an access control.
    pub admin: bool,
}

/// Form contents for creating or editing an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorDraft {
    pub name: String,
    pub hex: String,
    pub usage: String,
    pub category: Category,
}

impl Default for ColorDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            hex: "#000000".to_string(),
            usage: String::new(),
            category: Category::Primary,
        }
    }
}

impl From<&ColorEntry> for ColorDraft {
    fn from(entry: &ColorEntry) -> Self {
        Self {
            name: entry.name.clone(),
            hex: entry.hex.clone(),
            usage: entry.usage.clone(),
            category: entry.category.clone(),
        }
    }
}

impl ColorDraft {
    /// A draft is acceptable when it has a name and a decodable hex code.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && parse_hex(&self.hex).is_some()
    }
}

/// Outcome of an accepted mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    /// Persist immediately, bypassing the bootstrap guard and starting at the
    /// remote document store.
    pub force_remote: bool,
}

impl Change {
    fn for_session(session: &Session) -> Self {
        Self {
            force_remote: session.admin,
        }
    }
}

/// Ordered list of palette entries.
#[derive(Debug, Clone)]
pub struct PaletteStore {
    entries: Vec<ColorEntry>,
}

impl Default for PaletteStore {
    fn default() -> Self {
        Self::new(default_palette())
    }
}

impl PaletteStore {
    pub fn new(entries: Vec<ColorEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ColorEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entries bucketed by category, buckets in display order, entries in list order.
    pub fn grouped(&self) -> Vec<(Category, Vec<&ColorEntry>)> {
        let mut buckets: BTreeMap<u8, (Category, Vec<&ColorEntry>)> = BTreeMap::new();
        for entry in &self.entries {
            let bucket = match &entry.category {
                Category::Other(_) => Category::Other(String::new()),
                known => known.clone(),
            };
            buckets
                .entry(bucket.rank())
                .or_insert_with(|| (bucket, Vec::new()))
                .1
                .push(entry);
        }
        buckets.into_values().collect()
    }

    /// Append a new entry. Available to every user.
    pub fn add(&mut self, draft: ColorDraft, session: &Session) -> Option<Change> {
        if !draft.is_valid() {
            debug!(name = %draft.name, hex = %draft.hex, "Rejected add: invalid draft");
            return None;
        }

        let entry = ColorEntry {
            id: self.next_id(),
            name: draft.name,
            hex: draft.hex,
            usage: draft.usage,
            category: draft.category,
        };
        debug!(id = %entry.id, "Adding colour");
        self.entries.push(entry);
        Some(Change::for_session(session))
    }

    /// Overwrite the fields of the entry with `id`, keeping its position.
    pub fn update(&mut self, id: &str, draft: ColorDraft, session: &Session) -> Option<Change> {
        if !draft.is_valid() {
            debug!(%id, hex = %draft.hex, "Rejected update: invalid draft");
            return None;
        }

        let entry = self.entries.iter_mut().find(|entry| entry.id == id)?;
        entry.name = draft.name;
        entry.hex = draft.hex;
        entry.usage = draft.usage;
        entry.category = draft.category;
        Some(Change::for_session(session))
    }

    pub fn delete(&mut self, id: &str, session: &Session) -> Option<Change> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        if self.entries.len() == before {
            debug!(%id, "Rejected delete: unknown id");
            return None;
        }
        Some(Change::for_session(session))
    }

    /// Swap in a whole new list (load, reload and import).
    pub fn replace(&mut self, entries: Vec<ColorEntry>) {
        self.entries = entries;
    }

    /// Restore the compiled-in defaults. Always forces a global write.
    pub fn reset_to_defaults(&mut self) -> Change {
        self.entries = default_palette();
        Change { force_remote: true }
    }

    fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }
}
