//! Supabase `colors` table accessed through its PostgREST endpoint.
//!
//! Saving replaces the table contents with a delete-all followed by a bulk
//! insert. The two requests are not atomic: if the insert fails after the
//! delete succeeded the table is left empty until the next successful save.

use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use tracing::{debug, instrument};

use super::{BoxFuture, LoadOutcome, SaveOutcome, StageKind, StorageError, StorageStage};
use crate::color::ColorEntry;

/// Project URL shipped in the sample environment file.
const PLACEHOLDER_URL: &str = "https://your-project.supabase.co";

/// Table holding one row per palette entry.
const TABLE: &str = "colors";

/// Connection details for the managed backend.
#[derive(Debug, Clone, Default)]
pub struct SupabaseSettings {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

impl SupabaseSettings {
    /// A real (non-placeholder) project URL is set.
    pub fn is_configured(&self) -> bool {
        self.url
            .as_deref()
            .map(str::trim)
            .is_some_and(|url| !url.is_empty() && url.trim_end_matches('/') != PLACEHOLDER_URL)
    }

    fn table_url(&self) -> Option<String> {
        let base = self.url.as_deref()?.trim().trim_end_matches('/');
        Some(format!("{base}/rest/v1/{TABLE}"))
    }
}

/// Row shape written to the table. `created_at` is filled by the database.
#[derive(Debug, Serialize)]
struct ColorRow<'a> {
    id: &'a str,
    name: &'a str,
    hex: &'a str,
    rgb: String,
    usage: &'a str,
    category: &'a str,
}

impl<'a> From<&'a ColorEntry> for ColorRow<'a> {
    fn from(entry: &'a ColorEntry) -> Self {
        Self {
            id: &entry.id,
            name: &entry.name,
            hex: &entry.hex,
            rgb: entry.rgb_string(),
            usage: &entry.usage,
            category: entry.category.as_str(),
        }
    }
}

/// Managed backend stage.
pub struct SupabaseStore {
    settings: SupabaseSettings,
    client: Client,
}

impl SupabaseStore {
    pub fn new(settings: SupabaseSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }

    fn table_url(&self) -> Result<String, StorageError> {
        self.settings.table_url().ok_or(StorageError::NotConfigured)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.settings.anon_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    /// All rows in creation order.
    #[instrument(level = "debug", skip(self))]
    pub async fn select_all(&self) -> Result<Vec<ColorEntry>, StorageError> {
        let request = self
            .client
            .get(self.table_url()?)
            .query(&[("select", "*"), ("order", "created_at.asc")]);
        let response = send(self.authorize(request)).await?;
        let rows = response
            .json::<Vec<ColorEntry>>()
            .await
            .map_err(|e| StorageError::Parse(e.to_string()))?;
        debug!(count = rows.len(), "Fetched palette rows");
        Ok(rows)
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn delete_all(&self) -> Result<(), StorageError> {
        // PostgREST refuses unfiltered deletes; every row has a non-empty id.
        let request = self.client.delete(self.table_url()?).query(&[("id", "neq.")]);
        send(self.authorize(request)).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self, colors), fields(count = colors.len()))]
    pub async fn insert_many(&self, colors: &[ColorEntry]) -> Result<(), StorageError> {
        let rows: Vec<ColorRow<'_>> = colors.iter().map(ColorRow::from).collect();
        let request = self
            .client
            .post(self.table_url()?)
            .header("Prefer", "return=minimal")
            .json(&rows);
        send(self.authorize(request)).await?;
        Ok(())
    }

    /// Full replace: delete every row, then insert the whole list.
    pub async fn replace_all(&self, colors: &[ColorEntry]) -> Result<(), StorageError> {
        self.delete_all().await?;
        self.insert_many(colors).await
    }
}

async fn send(request: RequestBuilder) -> Result<Response, StorageError> {
    let response = request
        .send()
        .await
        .map_err(|e| StorageError::Transport(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(StorageError::Status(status.as_u16()));
    }
    Ok(response)
}

impl StorageStage for SupabaseStore {
    fn kind(&self) -> StageKind {
        StageKind::Managed
    }

    fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    fn try_load(&self) -> BoxFuture<'_, LoadOutcome> {
        Box::pin(async move {
            match self.select_all().await {
                Ok(rows) if rows.is_empty() => LoadOutcome::Empty,
                Ok(rows) => LoadOutcome::Loaded(rows),
                Err(err) => LoadOutcome::Failed(err),
            }
        })
    }

    fn try_save<'a>(&'a self, colors: &'a [ColorEntry]) -> BoxFuture<'a, SaveOutcome> {
        Box::pin(async move {
            match self.replace_all(colors).await {
                Ok(()) => SaveOutcome::Saved,
                Err(err) => SaveOutcome::Failed(err),
            }
        })
    }
}
