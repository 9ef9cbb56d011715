use crate::config::StoreConfig;
use crate::types::{DocumentEnvelope, PatchRequest};
use settler::{MutationError, Patch, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// HTTP client wrapper for a remote document store.
///
/// One client per store; collections are addressed per call as
/// `{base_url}/{collection}/{document_id}`.
pub struct StoreClient {
    base_url: String,
    request_timeout_ms: u64,
    http_client: reqwest::Client,
    last_success: Arc<AtomicU64>, // Unix timestamp in seconds
}

impl StoreClient {
    pub fn new(config: &StoreConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout_ms: config.request_timeout_ms,
            http_client,
            last_success: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn last_success_timestamp(&self) -> u64 {
        self.last_success.load(Ordering::Relaxed)
    }

    /// Fetch one document.
    pub async fn get_document(&self, collection: &str, id: &str) -> Result<DocumentEnvelope> {
        let url = format!("{}/{}/{}", self.base_url, collection, id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let envelope = self.parse_document(response).await?;
        self.mark_success();
        Ok(envelope)
    }

    /// Apply a partial update to one document and return the stored result.
    pub async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: Patch,
        expected_version: Option<u64>,
    ) -> Result<DocumentEnvelope> {
        let url = format!("{}/{}/{}", self.base_url, collection, id);
        let body = PatchRequest {
            fields,
            expected_version,
        };

        let response = self
            .http_client
            .patch(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let envelope = self.parse_document(response).await?;
        self.mark_success();
        Ok(envelope)
    }

    async fn parse_document(&self, response: reqwest::Response) -> Result<DocumentEnvelope> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        response
            .json::<DocumentEnvelope>()
            .await
            .map_err(|e| MutationError::Json(format!("Malformed store response: {}", e)))
    }

    fn transport_error(&self, e: reqwest::Error) -> MutationError {
        if e.is_timeout() {
            MutationError::Timeout {
                waited_ms: self.request_timeout_ms,
            }
        } else {
            MutationError::Network(e.to_string())
        }
    }

    fn mark_success(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.last_success.store(now, Ordering::Relaxed);
    }
}

/// Map a non-success store response to the mutation error taxonomy.
///
/// 4xx semantic statuses are terminal; 429 and every 5xx classify as
/// retryable availability problems.
fn classify_status(status: reqwest::StatusCode, body: &str) -> MutationError {
    let detail = extract_error_message(body).unwrap_or_else(|| status.to_string());

    match status.as_u16() {
        401 => MutationError::Unauthenticated(detail),
        403 => MutationError::PermissionDenied(detail),
        404 => MutationError::NotFound(detail),
        409 => MutationError::VersionConflict {
            expected: extract_u64(body, "expected_version").unwrap_or(0),
            actual: extract_u64(body, "actual_version"),
        },
        400 | 422 => MutationError::Validation(detail),
        429 => MutationError::RateLimited,
        _ => MutationError::Unavailable(detail),
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn extract_u64(body: &str, key: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get(key).and_then(|v| v.as_u64())
}
