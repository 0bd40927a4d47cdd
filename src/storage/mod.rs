//! Layered persistence for the palette.
//!
//! Stages are tried in priority order: the GitHub-hosted document (global
//! admin truth), the Supabase table (shared backend) and finally the local
//! per-user file. Reads and writes stop at the first stage that succeeds.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::color::{default_palette, is_bootstrap_default, ColorEntry};

pub mod github;
pub mod local;
pub mod supabase;

pub use github::{GithubDocumentStore, GithubSettings};
pub use local::LocalStore;
pub use supabase::{SupabaseSettings, SupabaseStore};

/// Boxed future returned by stage methods so stages can live behind `dyn`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised by individual stages. None of them are fatal to the cascade.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Stage is not configured")]
    NotConfigured,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Malformed palette data: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Parse(err.to_string())
    }
}

/// Identifies a stage in logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Remote,
    Managed,
    Local,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageKind::Remote => "github",
            StageKind::Managed => "supabase",
            StageKind::Local => "local",
        })
    }
}

/// Result of a read attempt.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Vec<ColorEntry>),
    /// Stage reachable but holds no palette yet. Remote stages report an
    /// empty stored list this way so the cascade moves on.
    Empty,
    Failed(StorageError),
}

/// Result of a write attempt.
#[derive(Debug)]
pub enum SaveOutcome {
    Saved,
    Failed(StorageError),
}

/// One backend in the cascade.
pub trait StorageStage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Static capability check; never touches the network.
    fn is_configured(&self) -> bool;

    fn try_load(&self) -> BoxFuture<'_, LoadOutcome>;

    fn try_save<'a>(&'a self, colors: &'a [ColorEntry]) -> BoxFuture<'a, SaveOutcome>;
}

/// Where the active list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Stage(StageKind),
    Defaults,
}

impl fmt::Display for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadSource::Stage(kind) => kind.fmt(f),
            LoadSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// What happened to a write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveReport {
    Saved(StageKind),
    /// The list is still the bootstrap default set; nothing was written.
    Skipped,
    /// Every configured stage failed.
    Failed,
}

/// Ordered list of stages.
pub struct Cascade {
    stages: Vec<Box<dyn StorageStage>>,
}

impl Cascade {
    pub fn new(stages: Vec<Box<dyn StorageStage>>) -> Self {
        Self { stages }
    }

    /// The production stack: GitHub, then Supabase, then the local file.
    pub fn standard(
        github: GithubDocumentStore,
        supabase: SupabaseStore,
        local: LocalStore,
    ) -> Self {
        Self::new(vec![Box::new(github), Box::new(supabase), Box::new(local)])
    }

    /// `(kind, configured)` for every stage, in priority order.
    pub fn status(&self) -> Vec<(StageKind, bool)> {
        self.stages
            .iter()
            .map(|stage| (stage.kind(), stage.is_configured()))
            .collect()
    }

    /// Read the palette from the first stage that has one, else the defaults.
    pub async fn load(&self) -> (Vec<ColorEntry>, LoadSource) {
        for stage in &self.stages {
            let kind = stage.kind();
            if !stage.is_configured() {
                debug!(stage = %kind, "Skipping unconfigured stage");
                continue;
            }

            match stage.try_load().await {
                LoadOutcome::Loaded(colors) => {
                    info!(stage = %kind, count = colors.len(), "Loaded palette");
                    return (colors, LoadSource::Stage(kind));
                }
                LoadOutcome::Empty => {
                    debug!(stage = %kind, "No palette stored");
                }
                LoadOutcome::Failed(err) => {
                    warn!(stage = %kind, error = %err, "Failed to load palette");
                }
            }
        }

        info!("Using built-in default palette");
        (default_palette(), LoadSource::Defaults)
    }

    /// Persist `colors` to the first stage that accepts them.
    ///
    /// Without `force` an unchanged bootstrap list is not written back.
    pub async fn save(&self, colors: &[ColorEntry], force: bool) -> SaveReport {
        if !force && is_bootstrap_default(colors) {
            debug!("Palette is still the bootstrap default; not saving");
            return SaveReport::Skipped;
        }

        for stage in &self.stages {
            let kind = stage.kind();
            if !stage.is_configured() {
                continue;
            }

            match stage.try_save(colors).await {
                SaveOutcome::Saved => {
                    info!(stage = %kind, count = colors.len(), "Saved palette");
                    return SaveReport::Saved(kind);
                }
                SaveOutcome::Failed(err) => {
                    warn!(stage = %kind, error = %err, "Failed to save palette");
                }
            }
        }

        SaveReport::Failed
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::color::Category;
    use std::sync::{Arc, Mutex};

    /// In-memory stage: answers the first load from a script, later loads
    /// from the most recent save.
    pub(crate) struct FakeStage {
        kind: StageKind,
        configured: bool,
        load: Mutex<Option<LoadOutcome>>,
        fail_save: bool,
        pub saved: Mutex<Vec<Vec<ColorEntry>>>,
        pub load_calls: Mutex<usize>,
    }

    impl FakeStage {
        pub(crate) fn new(kind: StageKind, configured: bool, load: LoadOutcome) -> Self {
            Self {
                kind,
                configured,
                load: Mutex::new(Some(load)),
                fail_save: false,
                saved: Mutex::new(Vec::new()),
                load_calls: Mutex::new(0),
            }
        }

        pub(crate) fn failing_saves(mut self) -> Self {
            self.fail_save = true;
            self
        }
    }

    impl StorageStage for FakeStage {
        fn kind(&self) -> StageKind {
            self.kind
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn try_load(&self) -> BoxFuture<'_, LoadOutcome> {
            Box::pin(async move {
                *self.load_calls.lock().unwrap() += 1;
                let scripted = self.load.lock().unwrap().take();
                scripted.unwrap_or_else(|| match self.saved.lock().unwrap().last() {
                    Some(colors) => LoadOutcome::Loaded(colors.clone()),
                    None => LoadOutcome::Empty,
                })
            })
        }

        fn try_save<'a>(&'a self, colors: &'a [ColorEntry]) -> BoxFuture<'a, SaveOutcome> {
            Box::pin(async move {
                if self.fail_save {
                    return SaveOutcome::Failed(StorageError::Status(500));
                }
                self.saved.lock().unwrap().push(colors.to_vec());
                SaveOutcome::Saved
            })
        }
    }

    /// Lets a test keep a handle on a stage after handing it to the cascade.
    impl StorageStage for Arc<FakeStage> {
        fn kind(&self) -> StageKind {
            self.as_ref().kind()
        }

        fn is_configured(&self) -> bool {
            self.as_ref().is_configured()
        }

        fn try_load(&self) -> BoxFuture<'_, LoadOutcome> {
            self.as_ref().try_load()
        }

        fn try_save<'a>(&'a self, colors: &'a [ColorEntry]) -> BoxFuture<'a, SaveOutcome> {
            self.as_ref().try_save(colors)
        }
    }

    pub(crate) fn sample(id: &str) -> ColorEntry {
        ColorEntry {
            id: id.into(),
            name: format!("Colour {id}"),
            hex: "#112233".into(),
            usage: String::new(),
            category: Category::Primary,
        }
    }

    #[tokio::test]
    async fn empty_remote_stage_falls_through_to_managed() {
        let remote = Arc::new(FakeStage::new(StageKind::Remote, true, LoadOutcome::Empty));
        let managed = Arc::new(FakeStage::new(
            StageKind::Managed,
            true,
            LoadOutcome::Loaded(vec![sample("m")]),
        ));
        let local = Arc::new(FakeStage::new(
            StageKind::Local,
            true,
            LoadOutcome::Loaded(vec![sample("l")]),
        ));
        let cascade = Cascade::new(vec![
            Box::new(remote.clone()),
            Box::new(managed.clone()),
            Box::new(local.clone()),
        ]);

        let (colors, source) = cascade.load().await;
        assert_eq!(source, LoadSource::Stage(StageKind::Managed));
        assert_eq!(colors, vec![sample("m")]);
        assert_eq!(*local.load_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn unconfigured_stages_are_never_touched() {
        let remote = Arc::new(FakeStage::new(
            StageKind::Remote,
            false,
            LoadOutcome::Loaded(vec![sample("r")]),
        ));
        let local = Arc::new(FakeStage::new(
            StageKind::Local,
            true,
            LoadOutcome::Loaded(vec![sample("x")]),
        ));
        let cascade = Cascade::new(vec![Box::new(remote.clone()), Box::new(local)]);

        let (colors, source) = cascade.load().await;
        assert_eq!(source, LoadSource::Stage(StageKind::Local));
        assert_eq!(colors, vec![sample("x")]);
        assert_eq!(*remote.load_calls.lock().unwrap(), 0);

        let report = cascade.save(&[sample("y")], false).await;
        assert_eq!(report, SaveReport::Saved(StageKind::Local));
        assert!(remote.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failures_fall_back_to_defaults() {
        let cascade = Cascade::new(vec![
            Box::new(FakeStage::new(
                StageKind::Remote,
                true,
                LoadOutcome::Failed(StorageError::Status(502)),
            )),
            Box::new(FakeStage::new(
                StageKind::Managed,
                true,
                LoadOutcome::Failed(StorageError::Transport("down".into())),
            )),
            Box::new(FakeStage::new(
                StageKind::Local,
                true,
                LoadOutcome::Failed(StorageError::Parse("bad".into())),
            )),
        ]);

        let (colors, source) = cascade.load().await;
        assert_eq!(source, LoadSource::Defaults);
        assert_eq!(colors, default_palette());
    }

    #[tokio::test]
    async fn save_stops_at_first_success() {
        let remote =
            Arc::new(FakeStage::new(StageKind::Remote, true, LoadOutcome::Empty).failing_saves());
        let managed = Arc::new(FakeStage::new(StageKind::Managed, true, LoadOutcome::Empty));
        let local = Arc::new(FakeStage::new(StageKind::Local, true, LoadOutcome::Empty));
        let cascade = Cascade::new(vec![
            Box::new(remote.clone()),
            Box::new(managed.clone()),
            Box::new(local.clone()),
        ]);

        let report = cascade.save(&[sample("a")], false).await;
        assert_eq!(report, SaveReport::Saved(StageKind::Managed));
        assert_eq!(managed.saved.lock().unwrap().len(), 1);
        assert!(local.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bootstrap_defaults_are_not_written_unless_forced() {
        let local = Arc::new(FakeStage::new(StageKind::Local, true, LoadOutcome::Empty));
        let cascade = Cascade::new(vec![Box::new(local.clone())]);

        assert_eq!(cascade.save(&default_palette(), false).await, SaveReport::Skipped);
        assert!(local.saved.lock().unwrap().is_empty());

        assert_eq!(
            cascade.save(&default_palette(), true).await,
            SaveReport::Saved(StageKind::Local)
        );
        assert_eq!(local.saved.lock().unwrap()[0], default_palette());
    }

    #[tokio::test]
    async fn save_reports_failure_when_every_stage_fails() {
        let cascade = Cascade::new(vec![Box::new(
            FakeStage::new(StageKind::Local, true, LoadOutcome::Empty).failing_saves(),
        )]);
        assert_eq!(cascade.save(&[sample("a")], false).await, SaveReport::Failed);
    }
}
