use serde::{Deserialize, Serialize};
use std::path::Path;

/// Client-side store settings, including the retry tunables the social
/// operations hand to their executors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Document store base URL, e.g. "http://10.0.1.2:8085".
    pub base_url: String,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,
    /// Commit attempts per mutation, including the first.
    pub max_attempts: u32,
    /// Linear backoff base for network-class retries.
    pub retry_base_ms: u64,
    /// Flat backoff for validation-style rechecks (username saves).
    pub validate_retry_ms: u64,
    /// Delay between read-your-writes polls after a profile save.
    pub verify_interval_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            base_url: "http://127.0.0.1:8085".to_string(),
            request_timeout_ms: 10_000,
            max_attempts: 3,
            retry_base_ms: 2_000,
            validate_retry_ms: 1_000,
            verify_interval_ms: 1_000,
        }
    }
}

impl StoreConfig {
    /// Load store configuration from {data_dir}/store.json, falling back to
    /// env-var overrides on compiled defaults.
    pub fn load_or_default(data_dir: &Path) -> Self {
        let store_json = data_dir.join("store.json");

        if store_json.exists() {
            match std::fs::read_to_string(&store_json) {
                Ok(content) => match serde_json::from_str::<StoreConfig>(&content) {
                    Ok(config) => {
                        tracing::info!(
                            "Loaded store config: base_url={}, max_attempts={}",
                            config.base_url,
                            config.max_attempts
                        );
                        return config;
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse store.json: {}, using defaults", e);
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read store.json: {}, using defaults", e);
                }
            }
        }

        let mut config = StoreConfig::default();
        if let Ok(url) = std::env::var("SETTLER_STORE_URL") {
            config.base_url = url;
        }
        if let Some(timeout) = std::env::var("SETTLER_STORE_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.request_timeout_ms = timeout;
        }
        config
    }
}
