//! Palette document stored as a single JSON file in a GitHub repository.
//!
//! The file is read and written through the repository contents API. Writes
//! are full overwrites; the blob SHA of the current file (if any) is fetched
//! first because GitHub requires it to replace an existing file.

use base64::Engine;
use chrono::Utc;
use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{BoxFuture, LoadOutcome, SaveOutcome, StageKind, StorageError, StorageStage};
use crate::color::ColorEntry;

/// Schema version written into every document.
pub const DOCUMENT_VERSION: &str = "1.0";

/// Repository path of the palette document.
pub const DEFAULT_DOCUMENT_PATH: &str = "data/colors.json";

/// Placeholder coordinates shipped in the sample configuration.
const PLACEHOLDER_OWNER: &str = "your-username";
const PLACEHOLDER_REPO: &str = "color-showcase";

/// Connection details for the document store.
#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub owner: String,
    pub repo: String,
    pub branch: Option<String>,
    pub path: String,
    pub token: Option<String>,
    /// API base URI override, used to point the client at a mock server.
    pub api_base: Option<String>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            owner: PLACEHOLDER_OWNER.to_string(),
            repo: PLACEHOLDER_REPO.to_string(),
            branch: None,
            path: DEFAULT_DOCUMENT_PATH.to_string(),
            token: None,
            api_base: None,
        }
    }
}

impl GithubSettings {
    /// A token is present and the coordinates are not the placeholders.
    pub fn is_configured(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.trim().is_empty())
            && self.owner != PLACEHOLDER_OWNER
            && self.repo != PLACEHOLDER_REPO
    }

    fn contents_route(&self) -> String {
        format!("/repos/{}/{}/contents/{}", self.owner, self.repo, self.path)
    }
}

/// JSON body of the palette document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteDocument {
    #[serde(default)]
    pub colors: Vec<ColorEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PaletteDocument {
    pub fn new(colors: &[ColorEntry]) -> Self {
        Self {
            colors: colors.to_vec(),
            last_updated: Some(Utc::now().to_rfc3339()),
            version: Some(DOCUMENT_VERSION.to_string()),
        }
    }
}

/// Subset of the contents API response we rely on.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// Decode the base64 `content` field of a contents response.
pub fn decode_document(encoded: &str) -> Result<PaletteDocument, StorageError> {
    let cleaned = encoded.replace(['\n', '\r', ' '], "");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| StorageError::Parse(format!("invalid base64 content: {e}")))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Pretty-printed, base64-encoded document ready for upload.
pub fn encode_document(document: &PaletteDocument) -> Result<String, StorageError> {
    let json = serde_json::to_string_pretty(document)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

/// Remote document stage.
pub struct GithubDocumentStore {
    settings: GithubSettings,
}

impl GithubDocumentStore {
    pub fn new(settings: GithubSettings) -> Self {
        Self { settings }
    }

    fn client(&self) -> Result<Octocrab, StorageError> {
        let mut builder = Octocrab::builder();
        if let Some(base) = &self.settings.api_base {
            builder = builder
                .base_uri(base.as_str())
                .map_err(|e| StorageError::Transport(e.to_string()))?;
        }
        match &self.settings.token {
            Some(token) => builder.personal_token(token.clone()).build(),
            None => builder.build(),
        }
        .map_err(|e| StorageError::Transport(e.to_string()))
    }

    /// Current file, or `None` when it does not exist yet.
    async fn fetch_contents(
        &self,
        client: &Octocrab,
    ) -> Result<Option<ContentsResponse>, StorageError> {
        let route = self.settings.contents_route();
        let result: Result<ContentsResponse, octocrab::Error> = match &self.settings.branch {
            Some(branch) => client.get(&route, Some(&[("ref", branch.as_str())])).await,
            None => client.get(&route, None::<&()>).await,
        };

        match result {
            Ok(contents) => Ok(Some(contents)),
            Err(octocrab::Error::GitHub { source, .. })
                if source.status_code == http::StatusCode::NOT_FOUND =>
            {
                debug!(path = %self.settings.path, "Palette document not found");
                Ok(None)
            }
            Err(err) => Err(map_octocrab_error(err)),
        }
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(owner = %self.settings.owner, repo = %self.settings.repo)
    )]
    pub async fn load(&self) -> Result<Option<PaletteDocument>, StorageError> {
        let client = self.client()?;
        let Some(contents) = self.fetch_contents(&client).await? else {
            return Ok(None);
        };
        let encoded = contents
            .content
            .ok_or_else(|| StorageError::Parse("contents response has no content".into()))?;
        decode_document(&encoded).map(Some)
    }

    #[instrument(level = "debug", skip(self, colors), fields(count = colors.len()))]
    pub async fn save(&self, colors: &[ColorEntry]) -> Result<(), StorageError> {
        let client = self.client()?;

        // A failed lookup is not fatal: GitHub rejects the PUT if a SHA was needed.
        let sha = match self.fetch_contents(&client).await {
            Ok(contents) => contents.map(|c| c.sha),
            Err(err) => {
                warn!(error = %err, "Could not read current document revision");
                None
            }
        };

        let document = PaletteDocument::new(colors);
        let body = PutContentsRequest {
            message: format!("Update color palette - {}", Utc::now().to_rfc3339()),
            content: encode_document(&document)?,
            sha: sha.as_deref(),
            branch: self.settings.branch.as_deref(),
        };

        let _: serde_json::Value = client
            .put(self.settings.contents_route(), Some(&body))
            .await
            .map_err(map_octocrab_error)?;
        Ok(())
    }
}

fn map_octocrab_error(err: octocrab::Error) -> StorageError {
    if let octocrab::Error::GitHub { source, .. } = &err {
        return StorageError::Status(source.status_code.as_u16());
    }
    StorageError::Transport(err.to_string())
}

impl StorageStage for GithubDocumentStore {
    fn kind(&self) -> StageKind {
        StageKind::Remote
    }

    fn is_configured(&self) -> bool {
        self.settings.is_configured()
    }

    fn try_load(&self) -> BoxFuture<'_, LoadOutcome> {
        Box::pin(async move {
            match self.load().await {
                Ok(Some(document)) if !document.colors.is_empty() => {
                    LoadOutcome::Loaded(document.colors)
                }
                Ok(_) => LoadOutcome::Empty,
                Err(err) => LoadOutcome::Failed(err),
            }
        })
    }

    fn try_save<'a>(&'a self, colors: &'a [ColorEntry]) -> BoxFuture<'a, SaveOutcome> {
        Box::pin(async move {
            match self.save(colors).await {
                Ok(()) => SaveOutcome::Saved,
                Err(err) => SaveOutcome::Failed(err),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::default_palette;
    use mockito::Matcher;
    use serde_json::json;

    const ROUTE: &str = "/repos/brand/palette/contents/data/colors.json";

    fn settings(server: &mockito::Server) -> GithubSettings {
        GithubSettings {
            owner: "brand".into(),
            repo: "palette".into(),
            branch: None,
            path: DEFAULT_DOCUMENT_PATH.into(),
            token: Some("ghp_test".into()),
            api_base: Some(format!("{}/", server.url())),
        }
    }

    fn contents_body(colors: serde_json::Value) -> String {
        let doc = json!({
            "colors": colors,
            "lastUpdated": "2024-05-01T00:00:00Z",
            "version": "1.0"
        });
        let encoded = base64::engine::general_purpose::STANDARD.encode(doc.to_string());
        // GitHub wraps base64 content at 60 columns.
        let wrapped: Vec<String> = encoded
            .as_bytes()
            .chunks(60)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect();
        json!({ "sha": "abc123", "content": wrapped.join("\n"), "encoding": "base64" }).to_string()
    }

    #[test]
    fn placeholder_coordinates_are_not_configured() {
        let mut s = GithubSettings {
            token: Some("t".into()),
            ..GithubSettings::default()
        };
        assert!(!s.is_configured());

        s.owner = "brand".into();
        assert!(!s.is_configured());

        s.repo = "palette".into();
        assert!(s.is_configured());

        s.token = Some("  ".into());
        assert!(!s.is_configured());
    }

    #[test]
    fn document_encoding_round_trips() {
        let doc = PaletteDocument::new(&default_palette());
        let decoded = decode_document(&encode_document(&doc).unwrap()).unwrap();
        assert_eq!(decoded.colors, default_palette());
        assert_eq!(decoded.version.as_deref(), Some(DOCUMENT_VERSION));
    }

    #[tokio::test]
    async fn loads_wrapped_base64_document() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", ROUTE)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(contents_body(json!([
                {"id": "g1", "name": "Remote", "hex": "#005a5e", "rgb": "rgb(0, 90, 94)", "usage": "", "category": "primary"}
            ])))
            .create_async()
            .await;

        let store = GithubDocumentStore::new(settings(&server));
        match store.try_load().await {
            LoadOutcome::Loaded(colors) => {
                assert_eq!(colors.len(), 1);
                assert_eq!(colors[0].id, "g1");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_document_is_empty_not_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ROUTE)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body("{\"message\":\"Not Found\"}")
            .create_async()
            .await;

        let store = GithubDocumentStore::new(settings(&server));
        assert!(matches!(store.try_load().await, LoadOutcome::Empty));
    }

    #[tokio::test]
    async fn empty_colors_array_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ROUTE)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(contents_body(json!([])))
            .create_async()
            .await;

        let store = GithubDocumentStore::new(settings(&server));
        assert!(matches!(store.try_load().await, LoadOutcome::Empty));
    }

    #[tokio::test]
    async fn server_error_is_reported_as_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ROUTE)
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body("{\"message\":\"boom\"}")
            .create_async()
            .await;

        let store = GithubDocumentStore::new(settings(&server));
        assert!(matches!(
            store.try_load().await,
            LoadOutcome::Failed(StorageError::Status(500))
        ));
    }

    #[tokio::test]
    async fn save_sends_existing_sha() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ROUTE)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(contents_body(json!([])))
            .create_async()
            .await;
        let put = server
            .mock("PUT", ROUTE)
            .match_body(Matcher::PartialJson(json!({ "sha": "abc123" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"content\":{\"sha\":\"def456\"}}")
            .create_async()
            .await;

        let store = GithubDocumentStore::new(settings(&server));
        assert!(matches!(store.try_save(&default_palette()).await, SaveOutcome::Saved));
        put.assert_async().await;
    }

    #[tokio::test]
    async fn save_creates_document_without_sha() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ROUTE)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body("{\"message\":\"Not Found\"}")
            .create_async()
            .await;
        let put = server
            .mock("PUT", ROUTE)
            .match_body(Matcher::Regex("\"message\":\"Update color palette - ".into()))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body("{\"content\":{\"sha\":\"new\"}}")
            .create_async()
            .await;

        let store = GithubDocumentStore::new(settings(&server));
        store.save(&default_palette()).await.unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_put_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", ROUTE)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body("{\"message\":\"Not Found\"}")
            .create_async()
            .await;
        server
            .mock("PUT", ROUTE)
            .with_status(409)
            .with_header("content-type", "application/json")
            .with_body("{\"message\":\"sha mismatch\"}")
            .create_async()
            .await;

        let store = GithubDocumentStore::new(settings(&server));
        assert!(matches!(
            store.try_save(&default_palette()).await,
            SaveOutcome::Failed(StorageError::Status(409))
        ));
    }
}
