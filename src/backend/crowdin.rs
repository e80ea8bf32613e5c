//! Crowdin API v2 client
//!
//! Stateless wrapper around the project endpoints the workflows need. Every
//! request carries the bearer token; unexpected statuses become
//! `SyncError::Backend` with the response body kept verbatim.
//!
//! # Example
//!
//! ```ignore
//! use hermes_sync::backend::{CrowdinClient, TranslationBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CrowdinClient::new("token".to_string(), "577773")?;
//!     let languages = client.list_languages().await?;
//!     println!("{:?}", languages);
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::backend::{CreateKeyOutcome, TranslationBackend};
use crate::error::{SyncError, SyncResult};
use crate::model::{BackendKeyId, LanguageIdIndex, TranslationKey};
use crate::sink::{ProgressSink, Stage};

pub const DEFAULT_API_BASE: &str = "https://api.crowdin.com/api/v2";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct IdData {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct UrlData {
    url: String,
}

#[derive(Debug, Deserialize)]
struct StringData {
    id: u64,
    identifier: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageProgressData {
    language: LanguageData,
    language_id: String,
}

#[derive(Debug, Deserialize)]
struct LanguageData {
    locale: String,
}

/// Status of a translation build
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildProgress {
    pub status: String,
    /// Percentage, 0-100
    #[serde(default)]
    pub progress: u32,
}

impl BuildProgress {
    pub fn is_finished(&self) -> bool {
        self.status == "finished"
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == "inProgress"
    }
}

#[derive(Clone)]
pub struct CrowdinClient {
    /// Bearer token
    token: String,
    /// HTTP client for async requests
    client: reqwest::Client,
    /// `<api base>/projects/<id>`
    project_url: String,
}

impl CrowdinClient {
    /// Create a client for `project_id` on the public Crowdin API
    pub fn new(token: String, project_id: &str) -> SyncResult<Self> {
        Self::with_api_base(token, project_id, DEFAULT_API_BASE)
    }

    /// Create a client against another API root (enterprise hosts, tests)
    pub fn with_api_base(token: String, project_id: &str, api_base: &str) -> SyncResult<Self> {
        if token.trim().is_empty() {
            return Err(SyncError::Config("Crowdin API token cannot be empty".to_string()));
        }
        if project_id.trim().is_empty() {
            return Err(SyncError::Config("Crowdin project id cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SyncError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            token,
            client,
            project_url: format!(
                "{}/projects/{}",
                api_base.trim_end_matches('/'),
                project_id.trim()
            ),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.project_url, path)
    }

    /// Turn a non-success response into a backend error carrying the body
    async fn failure(response: reqwest::Response, context: String) -> SyncError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        SyncError::backend(context, status, body)
    }

    /// Start an export build. Returns the build id.
    pub async fn initiate_build(&self) -> SyncResult<u64> {
        let response = self
            .client
            .post(self.url("/translations/builds"))
            .bearer_auth(&self.token)
            .json(&json!({}))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "Failed to initiate build".to_string()).await);
        }

        let envelope: Envelope<IdData> = response.json().await?;
        tracing::info!(build_id = envelope.data.id, "build initiated");
        Ok(envelope.data.id)
    }

    /// One status check of a build
    pub async fn build_status(&self, build_id: u64) -> SyncResult<BuildProgress> {
        let response = self
            .client
            .get(self.url(&format!("/translations/builds/{}", build_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "Failed to check build status".to_string()).await);
        }

        let envelope: Envelope<BuildProgress> = response.json().await?;
        Ok(envelope.data)
    }

    /// Wait for a build to reach a terminal state
    ///
    /// Checks every `interval` while the build is `inProgress`. There is no
    /// overall deadline. `finished` returns `Ok`, any other status fails with
    /// `SyncError::BuildFailed` carrying the status verbatim.
    pub async fn poll_build_status(
        &self,
        build_id: u64,
        interval: Duration,
        sink: &dyn ProgressSink,
    ) -> SyncResult<()> {
        loop {
            let build = self.build_status(build_id).await?;
            tracing::debug!(build_id, status = %build.status, progress = build.progress, "build status");
            sink.report_progress(Stage::Build, build.progress as usize, 100);

            if build.is_finished() {
                return Ok(());
            }
            if !build.is_in_progress() {
                return Err(SyncError::BuildFailed(build.status));
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Download a finished build to `save_path`
    ///
    /// Resolves the short-lived download URL, then streams the archive to disk.
    /// Byte progress is reported only when the server sends a content length.
    pub async fn download_build(
        &self,
        build_id: u64,
        save_path: &Path,
        sink: &dyn ProgressSink,
    ) -> SyncResult<PathBuf> {
        let response = self
            .client
            .get(self.url(&format!("/translations/builds/{}/download", build_id)))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "Failed to download build".to_string()).await);
        }

        let envelope: Envelope<UrlData> = response.json().await?;
        let mut download = self.client.get(&envelope.data.url).send().await?;
        if !download.status().is_success() {
            return Err(Self::failure(download, "Failed to fetch build archive".to_string()).await);
        }

        let total = download.content_length().unwrap_or(0) as usize;
        let mut file = tokio::fs::File::create(save_path)
            .await
            .map_err(|e| SyncError::io(save_path, e))?;

        let mut downloaded = 0usize;
        while let Some(chunk) = download.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| SyncError::io(save_path, e))?;
            downloaded += chunk.len();
            if total > 0 {
                sink.report_progress(Stage::Download, downloaded, total);
            }
        }
        file.flush().await.map_err(|e| SyncError::io(save_path, e))?;

        tracing::info!(bytes = downloaded, path = %save_path.display(), "build downloaded");
        Ok(save_path.to_path_buf())
    }
}

impl std::fmt::Debug for CrowdinClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrowdinClient")
            .field("token", &"***")
            .field("project_url", &self.project_url)
            .finish()
    }
}

#[async_trait]
impl TranslationBackend for CrowdinClient {
    async fn list_languages(&self) -> SyncResult<LanguageIdIndex> {
        let response = self
            .client
            .get(self.url("/languages/progress"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, "Failed to get languages".to_string()).await);
        }

        let envelope: Envelope<Vec<Envelope<LanguageProgressData>>> = response.json().await?;
        Ok(envelope
            .data
            .into_iter()
            .map(|item| (item.data.language.locale, item.data.language_id))
            .collect())
    }

    async fn create_key(
        &self,
        key: &TranslationKey,
        display_text: &str,
        file_id: u64,
    ) -> SyncResult<CreateKeyOutcome> {
        let response = self
            .client
            .post(self.url("/strings"))
            .bearer_auth(&self.token)
            .json(&json!({
                "text": display_text,
                "identifier": key.as_str(),
                "fileId": file_id,
            }))
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::debug!(%key, "identifier conflict");
            return Ok(CreateKeyOutcome::AlreadyExists);
        }
        if !response.status().is_success() {
            return Err(Self::failure(response, format!("Failed to add key '{}'", key)).await);
        }

        let envelope: Envelope<StringData> = response.json().await?;
        tracing::debug!(identifier = %envelope.data.identifier, id = envelope.data.id, "string created");
        Ok(CreateKeyOutcome::Created(BackendKeyId(envelope.data.id)))
    }

    async fn key_exists(&self, key: &TranslationKey) -> SyncResult<bool> {
        let url = reqwest::Url::parse_with_params(&self.url("/strings"), &[("filter", key.as_str())])
            .map_err(|e| SyncError::Config(format!("Invalid string lookup URL: {}", e)))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(response, format!("Failed to look up key '{}'", key)).await);
        }

        let envelope: Envelope<Vec<serde_json::Value>> = response.json().await?;
        Ok(!envelope.data.is_empty())
    }

    async fn attach_translation(
        &self,
        key_id: BackendKeyId,
        language_id: &str,
        text: &str,
    ) -> SyncResult<()> {
        let response = self
            .client
            .post(self.url("/translations"))
            .bearer_auth(&self.token)
            .json(&json!({
                "stringId": key_id.0,
                "languageId": language_id,
                "text": text,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::failure(
                response,
                format!("Failed to add {} translation for string {}", language_id, key_id),
            )
            .await);
        }
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "Crowdin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> CrowdinClient {
        CrowdinClient::with_api_base("tok".to_string(), "42", &server.url()).unwrap()
    }

    #[test]
    fn test_new_rejects_empty_token_and_project() {
        assert!(matches!(
            CrowdinClient::new("".to_string(), "1"),
            Err(SyncError::Config(_))
        ));
        assert!(matches!(
            CrowdinClient::new("tok".to_string(), " "),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn test_debug_output_masks_token() {
        let client = CrowdinClient::new("secret".to_string(), "1").unwrap();
        let debug_str = format!("{:?}", client);
        assert!(debug_str.contains("***"));
        assert!(!debug_str.contains("secret"));
        assert!(debug_str.contains("https://api.crowdin.com/api/v2/projects/1"));
    }

    #[tokio::test]
    async fn test_list_languages() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/projects/42/languages/progress")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body(
                json!({
                    "data": [
                        { "data": { "language": { "locale": "en-US" }, "languageId": "en" } },
                        { "data": { "language": { "locale": "zh-TW" }, "languageId": "zh-TW" } }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let languages = client(&server).list_languages().await.unwrap();
        assert_eq!(languages.len(), 2);
        assert_eq!(languages.get("en-US").map(String::as_str), Some("en"));
        assert_eq!(languages.get("zh-TW").map(String::as_str), Some("zh-TW"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_key_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/projects/42/strings")
            .match_body(Matcher::Json(json!({
                "text": "greeting",
                "identifier": "__greeting",
                "fileId": 15
            })))
            .with_status(201)
            .with_body(r#"{"data":{"id":991,"identifier":"__greeting"}}"#)
            .create_async()
            .await;

        let outcome = client(&server)
            .create_key(&"__greeting".into(), "greeting", 15)
            .await
            .unwrap();
        assert_eq!(outcome, CreateKeyOutcome::Created(BackendKeyId(991)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_key_conflict_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _m1 = server
            .mock("POST", "/projects/42/strings")
            .with_status(409)
            .with_body(r#"{"error":"identifier taken"}"#)
            .create_async()
            .await;

        let outcome = client(&server)
            .create_key(&"__greeting".into(), "greeting", 15)
            .await
            .unwrap();
        assert_eq!(outcome, CreateKeyOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_key_failure_keeps_body() {
        let mut server = mockito::Server::new_async().await;
        let _m2 = server
            .mock("POST", "/projects/42/strings")
            .with_status(400)
            .with_body(r#"{"errors":[{"key":"fileId"}]}"#)
            .create_async()
            .await;

        let err = client(&server)
            .create_key(&"__greeting".into(), "greeting", 15)
            .await
            .unwrap_err();
        match err {
            SyncError::Backend {
                status, body, context,
            } => {
                assert_eq!(status, 400);
                assert!(body.contains("fileId"));
                assert!(context.contains("__greeting"));
            }
            other => panic!("Expected Backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_key_exists_uses_filter() {
        let mut server = mockito::Server::new_async().await;
        let _m3 = server
            .mock("GET", "/projects/42/strings")
            .match_query(Matcher::UrlEncoded("filter".into(), "__總計".into()))
            .with_status(200)
            .with_body(r#"{"data":[{"data":{"id":5}}]}"#)
            .create_async()
            .await;
        let _m4 = server
            .mock("GET", "/projects/42/strings")
            .match_query(Matcher::UrlEncoded("filter".into(), "__missing".into()))
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let client = client(&server);
        assert!(client.key_exists(&"__總計".into()).await.unwrap());
        assert!(!client.key_exists(&"__missing".into()).await.unwrap());
    }

    #[tokio::test]
    async fn test_attach_translation() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("POST", "/projects/42/translations")
            .match_body(Matcher::Json(json!({
                "stringId": 991,
                "languageId": "fr",
                "text": "Bonjour"
            })))
            .with_status(201)
            .with_body(r#"{"data":{"id":1}}"#)
            .create_async()
            .await;

        client(&server)
            .attach_translation(BackendKeyId(991), "fr", "Bonjour")
            .await
            .unwrap();
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_attach_translation_failure() {
        let mut server = mockito::Server::new_async().await;
        let _m5 = server
            .mock("POST", "/projects/42/translations")
            .with_status(400)
            .with_body("bad language")
            .create_async()
            .await;

        let err = client(&server)
            .attach_translation(BackendKeyId(1), "xx", "text")
            .await
            .unwrap_err();
        assert!(err.is_backend());
        assert!(err.to_string().contains("bad language"));
    }

    #[tokio::test]
    async fn test_initiate_build() {
        let mut server = mockito::Server::new_async().await;
        let _m6 = server
            .mock("POST", "/projects/42/translations/builds")
            .with_status(201)
            .with_body(r#"{"data":{"id":77,"status":"inProgress"}}"#)
            .create_async()
            .await;

        assert_eq!(client(&server).initiate_build().await.unwrap(), 77);
    }

    #[tokio::test]
    async fn test_poll_finished_build() {
        let mut server = mockito::Server::new_async().await;
        let _m7 = server
            .mock("GET", "/projects/42/translations/builds/77")
            .with_status(200)
            .with_body(r#"{"data":{"status":"finished","progress":100}}"#)
            .create_async()
            .await;

        let sink = MemorySink::new();
        client(&server)
            .poll_build_status(77, Duration::from_millis(1), &sink)
            .await
            .unwrap();
        assert_eq!(sink.progress_for(Stage::Build), vec![(100, 100)]);
    }

    #[tokio::test]
    async fn test_poll_failed_build_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        let _m8 = server
            .mock("GET", "/projects/42/translations/builds/77")
            .with_status(200)
            .with_body(r#"{"data":{"status":"canceled","progress":30}}"#)
            .create_async()
            .await;

        let err = client(&server)
            .poll_build_status(77, Duration::from_millis(1), &MemorySink::new())
            .await
            .unwrap_err();
        match err {
            SyncError::BuildFailed(status) => assert_eq!(status, "canceled"),
            other => panic!("Expected BuildFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_build_streams_to_disk() {
        let mut server = mockito::Server::new_async().await;
        let archive_url = format!("{}/files/archive.zip", server.url());
        let _m9 = server
            .mock("GET", "/projects/42/translations/builds/77/download")
            .with_status(200)
            .with_body(json!({ "data": { "url": archive_url } }).to_string())
            .create_async()
            .await;
        let _m10 = server
            .mock("GET", "/files/archive.zip")
            .with_status(200)
            .with_body("PK-archive-bytes")
            .create_async()
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("translations.zip");
        let sink = MemorySink::new();
        let path = client(&server)
            .download_build(77, &target, &sink)
            .await
            .unwrap();

        assert_eq!(path, target);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "PK-archive-bytes");
        if let Some(last) = sink.progress_for(Stage::Download).last() {
            assert_eq!(last, &(16, 16));
        }
    }
}
