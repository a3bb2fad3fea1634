//! Remote repository service client
//!
//! Health probe, conditional multi-file download resolution, zip bundle
//! retrieval and pull request creation, all issued over the route-racing
//! transport.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::header;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SyncError};
use crate::models::{FileOperation, PullRequestOutcome, PullRequestRequest};
use crate::services::route_racing::RouteRacingClient;

const CLIENT_USER_AGENT: &str = "LangSync-Client";

/// Liveness of the remote repository service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Unknown,
}

/// Result of the health probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: Option<DateTime<Utc>>,
}

impl HealthReport {
    fn unknown() -> Self {
        Self {
            status: HealthStatus::Unknown,
            timestamp: None,
        }
    }
}

/// One resolved download target
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadPathItem {
    pub url: String,
    pub path: String,
}

/// Resolved download URLs for a path set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadPathsResult {
    pub items: Vec<DownloadPathItem>,
    pub etag: Option<String>,
    pub is_not_modified: bool,
}

/// A bulk download packaged as a single zip archive
#[derive(Debug, Clone)]
pub struct FilesDownloadResult {
    pub paths: Vec<String>,
    pub content: Vec<u8>,
    pub size: usize,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub etag: Option<String>,
    pub is_not_modified: bool,
}

/// A single-path archive retrieval
#[derive(Debug, Clone)]
pub struct ZipDownloadResult {
    pub path: String,
    pub content: Vec<u8>,
    pub size: usize,
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PathsPayload {
    paths: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HealthBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadPathsBody {
    #[serde(default)]
    items: Vec<DownloadPathItem>,
}

/// Client for the remote repository service
pub struct RemoteRepositoryClient {
    racing: Arc<RouteRacingClient>,
    base_url: Url,
    auth_token: Option<String>,
}

impl RemoteRepositoryClient {
    pub fn new(racing: Arc<RouteRacingClient>, mut base_url: Url, auth_token: Option<String>) -> Self {
        // Keep a trailing slash so Url::join appends instead of replacing
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            racing,
            base_url,
            auth_token,
        }
    }

    /// Probe service liveness; any failed or non-parseable response is
    /// reported as `Unknown`, never as an error
    pub async fn get_health(&self) -> Result<HealthReport> {
        let url = self.endpoint("health")?;
        let token = self.auth_token.clone();

        let outcome = self
            .racing
            .execute(move |client| {
                let url = url.clone();
                let token = token.clone();
                Box::pin(async move {
                    let response = apply_headers(client.get(url), token.as_deref())
                        .send()
                        .await?;
                    if !response.status().is_success() {
                        return Err(SyncError::External(format!(
                            "health endpoint returned {}",
                            response.status()
                        )));
                    }
                    let report = match response.json::<HealthBody>().await {
                        Ok(body) => HealthReport {
                            status: match body.status.as_deref() {
                                Some(status) if status.eq_ignore_ascii_case("ok") => {
                                    HealthStatus::Ok
                                }
                                _ => HealthStatus::Unknown,
                            },
                            timestamp: body.timestamp,
                        },
                        Err(_) => HealthReport::unknown(),
                    };
                    Ok(report)
                })
            })
            .await;

        match outcome {
            Ok(report) => Ok(report),
            Err(SyncError::Cancelled) => Err(SyncError::Cancelled),
            Err(err) => {
                tracing::debug!(error = %err, "health probe failed");
                Ok(HealthReport::unknown())
            }
        }
    }

    /// Resolve download URLs for a path set, with conditional-request support
    pub async fn get_download_paths(
        &self,
        paths: &[String],
        etag: Option<&str>,
    ) -> Result<DownloadPathsResult> {
        let url = self.endpoint("files/paths")?;
        let token = self.auth_token.clone();
        let payload = PathsPayload {
            paths: paths.to_vec(),
        };
        let payload = serde_json::to_value(&payload)?;
        let etag = etag.map(str::to_string);

        self.racing
            .execute(move |client| {
                let url = url.clone();
                let token = token.clone();
                let payload = payload.clone();
                let etag = etag.clone();
                Box::pin(async move {
                    let mut request =
                        apply_headers(client.post(url), token.as_deref()).json(&payload);
                    if let Some(tag) = etag.as_deref() {
                        request = request.header(header::IF_NONE_MATCH, tag);
                    }
                    let response = request.send().await?;

                    if response.status() == StatusCode::NOT_MODIFIED {
                        return Ok(DownloadPathsResult {
                            items: Vec::new(),
                            etag,
                            is_not_modified: true,
                        });
                    }
                    if !response.status().is_success() {
                        return Err(classify_response(response).await);
                    }

                    let etag_out = header_string(&response, header::ETAG);
                    let body: DownloadPathsBody = response.json().await.map_err(|err| {
                        SyncError::Unexpected(format!("malformed download paths response: {err}"))
                    })?;
                    Ok(DownloadPathsResult {
                        items: body.items,
                        etag: etag_out,
                        is_not_modified: false,
                    })
                })
            })
            .await
    }

    /// Download a path set as one zip archive, with conditional-request support
    pub async fn download_files(
        &self,
        paths: &[String],
        etag: Option<&str>,
    ) -> Result<FilesDownloadResult> {
        let url = self.endpoint("files/download")?;
        let token = self.auth_token.clone();
        let request_paths = paths.to_vec();
        let payload = serde_json::to_value(PathsPayload {
            paths: request_paths.clone(),
        })?;
        let etag = etag.map(str::to_string);

        self.racing
            .execute(move |client| {
                let url = url.clone();
                let token = token.clone();
                let payload = payload.clone();
                let etag = etag.clone();
                let request_paths = request_paths.clone();
                Box::pin(async move {
                    let mut request =
                        apply_headers(client.post(url), token.as_deref()).json(&payload);
                    if let Some(tag) = etag.as_deref() {
                        request = request.header(header::IF_NONE_MATCH, tag);
                    }
                    let response = request.send().await?;

                    if response.status() == StatusCode::NOT_MODIFIED {
                        return Ok(FilesDownloadResult {
                            paths: request_paths,
                            content: Vec::new(),
                            size: 0,
                            content_type: None,
                            file_name: None,
                            etag,
                            is_not_modified: true,
                        });
                    }
                    if !response.status().is_success() {
                        return Err(classify_response(response).await);
                    }

                    let content_type = header_string(&response, header::CONTENT_TYPE);
                    let file_name = header_string(&response, header::CONTENT_DISPOSITION)
                        .as_deref()
                        .and_then(filename_from_content_disposition);
                    let etag_out = header_string(&response, header::ETAG);
                    let content = response.bytes().await?.to_vec();

                    Ok(FilesDownloadResult {
                        paths: request_paths,
                        size: content.len(),
                        content,
                        content_type,
                        file_name,
                        etag: etag_out,
                        is_not_modified: false,
                    })
                })
            })
            .await
    }

    /// Retrieve a single path packaged as a zip archive
    pub async fn download_zip(&self, path: &str) -> Result<ZipDownloadResult> {
        let mut url = self.endpoint("download")?;
        url.query_pairs_mut().append_pair("path", path);
        let token = self.auth_token.clone();
        let request_path = path.to_string();

        self.racing
            .execute(move |client| {
                let url = url.clone();
                let token = token.clone();
                let request_path = request_path.clone();
                Box::pin(async move {
                    let response = apply_headers(client.get(url), token.as_deref())
                        .send()
                        .await?;
                    if !response.status().is_success() {
                        return Err(classify_response(response).await);
                    }
                    let content = response.bytes().await?.to_vec();
                    Ok(ZipDownloadResult {
                        path: request_path,
                        size: content.len(),
                        content,
                        message: None,
                    })
                })
            })
            .await
    }

    /// Submit a batch of file operations as one pull request.
    ///
    /// A well-formed response with `success = false` is returned to the
    /// caller as-is; only transport, HTTP and parse failures become errors.
    pub async fn create_pull_request(
        &self,
        request: &PullRequestRequest,
    ) -> Result<PullRequestOutcome> {
        validate_pull_request(request)?;

        let url = self.endpoint("pulls")?;
        let token = self.auth_token.clone();
        let payload = serde_json::to_value(request)?;

        self.racing
            .execute(move |client| {
                let url = url.clone();
                let token = token.clone();
                let payload = payload.clone();
                Box::pin(async move {
                    let response = apply_headers(client.post(url), token.as_deref())
                        .json(&payload)
                        .send()
                        .await?;
                    if !response.status().is_success() {
                        return Err(classify_response(response).await);
                    }
                    let outcome: PullRequestOutcome =
                        response.json().await.map_err(|err| {
                            SyncError::Unexpected(format!(
                                "malformed pull request response: {err}"
                            ))
                        })?;
                    Ok(outcome)
                })
            })
            .await
    }

    fn endpoint(&self, segment: &str) -> Result<Url> {
        self.base_url
            .join(segment)
            .map_err(|err| SyncError::Validation(format!("invalid endpoint '{segment}': {err}")))
    }
}

fn validate_pull_request(request: &PullRequestRequest) -> Result<()> {
    if request.branch_name.trim().is_empty() {
        return Err(SyncError::Validation(
            "branch name must not be empty".to_string(),
        ));
    }
    if request.commit_message.trim().is_empty() {
        return Err(SyncError::Validation(
            "commit message must not be empty".to_string(),
        ));
    }
    if request.files.is_empty() {
        return Err(SyncError::Validation(
            "a pull request needs at least one file operation".to_string(),
        ));
    }
    for file in &request.files {
        if file.path.trim().is_empty() {
            return Err(SyncError::Validation(
                "file operations must carry a path".to_string(),
            ));
        }
        match file.operation {
            FileOperation::Upsert if file.content.is_none() => {
                return Err(SyncError::Validation(format!(
                    "upsert for '{}' is missing content",
                    file.path
                )));
            }
            FileOperation::Delete if file.content.is_some() => {
                return Err(SyncError::Validation(format!(
                    "delete for '{}' must not carry content",
                    file.path
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn apply_headers(
    builder: reqwest::RequestBuilder,
    token: Option<&str>,
) -> reqwest::RequestBuilder {
    let builder = builder.header(header::USER_AGENT, CLIENT_USER_AGENT);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

/// Map a non-success HTTP response onto the error taxonomy
async fn classify_response(response: reqwest::Response) -> SyncError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            SyncError::Validation(trimmed_body(&body, "request rejected by remote"))
        }
        StatusCode::NOT_FOUND => SyncError::NotFound(trimmed_body(&body, "remote object absent")),
        StatusCode::CONFLICT => {
            SyncError::Conflict(trimmed_body(&body, "remote state changed concurrently"))
        }
        _ => SyncError::External(format!("remote service returned {}: {}", status, body)),
    }
}

fn trimmed_body(body: &str, fallback: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn header_string(response: &reqwest::Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn filename_from_content_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
