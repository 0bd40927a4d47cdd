//! Application controller: palette state, storage cascade and session.
//!
//! UI layers (one-shot CLI commands and the interactive session) only talk to
//! [`Showcase`]; it applies a mutation to the in-memory list and then runs the
//! write cascade for it.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::admin::{AdminError, AdminGate};
use crate::color::ColorEntry;
use crate::exchange::{self, ImportError};
use crate::palette::{Change, ColorDraft, PaletteStore, Session};
use crate::storage::{Cascade, LoadSource, SaveReport, StageKind};

/// What a reset did, which depends on admin mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// Admin: defaults restored and written globally.
    Restored(SaveReport),
    /// Viewer: list re-read from storage, nothing written.
    Reloaded(LoadSource),
}

pub struct Showcase {
    store: PaletteStore,
    cascade: Cascade,
    session: Session,
    gate: AdminGate,
}

impl Showcase {
    /// Controller seeded with the defaults; call [`Showcase::load`] to read storage.
    pub fn new(cascade: Cascade, gate: AdminGate) -> Self {
        Self {
            store: PaletteStore::default(),
            cascade,
            session: Session::default(),
            gate,
        }
    }

    pub fn entries(&self) -> &[ColorEntry] {
        self.store.entries()
    }

    pub fn store(&self) -> &PaletteStore {
        &self.store
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn stage_status(&self) -> Vec<(StageKind, bool)> {
        self.cascade.status()
    }

    /// Replace the list with the first palette the read cascade yields.
    pub async fn load(&mut self) -> LoadSource {
        let (colors, source) = self.cascade.load().await;
        self.store.replace(colors);
        source
    }

    /// Read-only refresh; never writes.
    pub async fn reload(&mut self) -> LoadSource {
        info!("Reloading palette from storage");
        self.load().await
    }

    /// `None` when the draft was rejected.
    pub async fn add(&mut self, draft: ColorDraft) -> Option<SaveReport> {
        let change = self.store.add(draft, &self.session)?;
        Some(self.persist(change).await)
    }

    pub async fn update(&mut self, id: &str, draft: ColorDraft) -> Option<SaveReport> {
        let change = self.store.update(id, draft, &self.session)?;
        Some(self.persist(change).await)
    }

    pub async fn delete(&mut self, id: &str) -> Option<SaveReport> {
        let change = self.store.delete(id, &self.session)?;
        Some(self.persist(change).await)
    }

    /// Admin: overwrite every store with the defaults. Viewer: reload.
    pub async fn reset(&mut self) -> ResetOutcome {
        if self.session.admin {
            info!("Admin reset to default palette");
            let change = self.store.reset_to_defaults();
            ResetOutcome::Restored(self.persist(change).await)
        } else {
            ResetOutcome::Reloaded(self.reload().await)
        }
    }

    /// Replace the whole list with the contents of an import file.
    ///
    /// A rejected file leaves the list untouched.
    pub async fn import_file(&mut self, path: &Path) -> Result<SaveReport, ImportError> {
        let colors = exchange::read_import(path)?;
        info!(path = %path.display(), count = colors.len(), "Imported palette");
        self.store.replace(colors);
        Ok(self.persist(Change { force_remote: false }).await)
    }

    pub fn export_to(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        exchange::export_palette(self.store.entries(), dir)
    }

    /// Flip admin mode. Returns the new state.
    pub fn toggle_admin(&mut self, attempt: &str) -> Result<bool, AdminError> {
        self.gate.toggle(&mut self.session, attempt)
    }

    pub fn unlock_admin(&mut self, attempt: &str) -> Result<(), AdminError> {
        self.gate.unlock(&mut self.session, attempt)
    }

    async fn persist(&self, change: Change) -> SaveReport {
        debug!(force = change.force_remote, "Persisting palette change");
        self.cascade
            .save(self.store.entries(), change.force_remote)
            .await
    }
}
