//! HTTP client for the Apps Script storage backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{BackendResponse, DriveBackend, UploadForm};
use crate::config::BackendConfig;
use crate::error::{DrivebotError, Result};
use crate::folder::FolderEntry;

/// User agent string for backend requests.
const USER_AGENT: &str = concat!("drivebot/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow (Apps Script answers via a redirect).
const MAX_REDIRECTS: usize = 5;

/// Apps Script web app client.
pub struct AppsScriptClient {
    client: Client,
    url: url::Url,
}

impl AppsScriptClient {
    /// Create a client from the backend configuration.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let url = url::Url::parse(&config.url)
            .map_err(|e| DrivebotError::Config(format!("invalid backend URL: {e}")))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DrivebotError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, url })
    }

    /// URL of the folder listing endpoint.
    pub fn list_url(&self) -> url::Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("action", "list");
        url
    }
}

#[async_trait]
impl DriveBackend for AppsScriptClient {
    async fn list_folders(&self) -> Result<Vec<FolderEntry>> {
        let response = self
            .client
            .get(self.list_url())
            .send()
            .await
            .map_err(|e| DrivebotError::Transport(format!("failed to list folders: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DrivebotError::Transport(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(DrivebotError::BackendRejected {
                status: Some(status.as_u16()),
                body,
            });
        }

        parse_folder_list(&body)
    }

    async fn upload(&self, form: &UploadForm) -> Result<BackendResponse> {
        debug!(
            filename = %form.filename,
            folder = form.folder.as_deref().unwrap_or(""),
            encoded_len = form.file.len(),
            "Posting upload"
        );

        let response = self
            .client
            .post(self.url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| DrivebotError::Transport(format!("failed to send upload: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DrivebotError::Transport(format!("failed to read response: {e}")))?;

        Ok(BackendResponse {
            status: Some(status),
            body,
        })
    }
}

/// Parse the listing body: a JSON array of `{name, id}` objects.
///
/// An empty body or JSON `null` is an empty listing.
pub fn parse_folder_list(body: &str) -> Result<Vec<FolderEntry>> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let entries: Option<Vec<FolderEntry>> = serde_json::from_str(body)
        .map_err(|e| DrivebotError::MalformedResponse(format!("{e}: {}", preview(body))))?;
    Ok(entries.unwrap_or_default())
}

fn preview(body: &str) -> String {
    const MAX_PREVIEW_CHARS: usize = 200;
    if body.chars().count() <= MAX_PREVIEW_CHARS {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX_PREVIEW_CHARS).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> BackendConfig {
        BackendConfig {
            url: url.to_string(),
            ..BackendConfig::default()
        }
    }

    #[test]
    fn test_parse_folder_list() {
        let entries =
            parse_folder_list(r#"[{"name":"A","id":"1"},{"name":"A/B","id":"2"}]"#).unwrap();
        assert_eq!(
            entries,
            vec![FolderEntry::new("A", "1"), FolderEntry::new("A/B", "2")]
        );
    }

    #[test]
    fn test_parse_folder_list_empty_and_null() {
        assert!(parse_folder_list("").unwrap().is_empty());
        assert!(parse_folder_list("  null ").unwrap().is_empty());
        assert!(parse_folder_list("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_folder_list_not_json() {
        let result = parse_folder_list("<html>Error</html>");
        assert!(matches!(result, Err(DrivebotError::MalformedResponse(_))));
    }

    #[test]
    fn test_parse_folder_list_wrong_shape() {
        assert!(matches!(
            parse_folder_list(r#"{"folders":[]}"#),
            Err(DrivebotError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_folder_list(r#"[{"name":"A"}]"#),
            Err(DrivebotError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_preview_truncates() {
        let long = "x".repeat(500);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 201);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn test_list_url_appends_action() {
        let client = AppsScriptClient::new(&config("https://script.google.com/macros/s/abc/exec")).unwrap();
        assert_eq!(
            client.list_url().as_str(),
            "https://script.google.com/macros/s/abc/exec?action=list"
        );
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(matches!(
            AppsScriptClient::new(&config("not a url")),
            Err(DrivebotError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_list_folders_transport_failure() {
        // Nothing listens on port 9 of localhost
        let client = AppsScriptClient::new(&config("http://127.0.0.1:9/exec")).unwrap();
        let result = client.list_folders().await;
        assert!(matches!(result, Err(DrivebotError::Transport(_))));
    }

    #[tokio::test]
    async fn test_upload_and_list_against_local_server() {
        use axum::routing::get;
        use axum::Router;
        use std::collections::HashMap;

        let app = Router::new().route(
            "/exec",
            get(|axum::extract::Query(q): axum::extract::Query<HashMap<String, String>>| async move {
                assert_eq!(q.get("action").map(String::as_str), Some("list"));
                r#"[{"name":"A","id":"1"}]"#
            })
            .post(|axum::Form(form): axum::Form<HashMap<String, String>>| async move {
                format!(
                    "✅ {} {} {} {}",
                    form["filename"],
                    form["mimeType"],
                    form["file"],
                    form.contains_key("folder")
                )
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = AppsScriptClient::new(&config(&format!("http://{addr}/exec"))).unwrap();

        let folders = client.list_folders().await.unwrap();
        assert_eq!(folders, vec![FolderEntry::new("A", "1")]);

        let response = client
            .upload(&UploadForm {
                file: "aGk=".to_string(),
                filename: "hi.txt".to_string(),
                mime_type: "text/plain".to_string(),
                folder: None,
            })
            .await
            .unwrap();
        assert_eq!(response.status, Some(200));
        assert_eq!(response.body, "✅ hi.txt text/plain aGk= false");
    }
}
