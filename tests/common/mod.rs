//! Shared test harness: an in-memory document store mounted on wiremock,
//! plus a `SocialManager` wired to it with fast retry tunables.

use serde_json::{json, Value};
use settler::{Notification, Notifier};
use settler_store::{SocialManager, StoreConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

type Fields = serde_json::Map<String, Value>;

/// Stateful store double: PATCH merges fields and bumps the version, GET
/// returns the stored envelope. Shared across responders so tests can
/// inspect final state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    docs: Arc<Mutex<HashMap<String, (u64, Fields)>>>,
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    pub fn seed(&self, collection: &str, id: &str, fields: Value) {
        let fields = fields.as_object().cloned().unwrap_or_default();
        self.docs
            .lock()
            .unwrap()
            .insert(format!("/{}/{}", collection, id), (1, fields));
    }

    pub fn fields(&self, collection: &str, id: &str) -> Option<Fields> {
        self.docs
            .lock()
            .unwrap()
            .get(&format!("/{}/{}", collection, id))
            .map(|(_, fields)| fields.clone())
    }

    pub fn version(&self, collection: &str, id: &str) -> Option<u64> {
        self.docs
            .lock()
            .unwrap()
            .get(&format!("/{}/{}", collection, id))
            .map(|(version, _)| *version)
    }

    pub fn string_array(&self, collection: &str, id: &str, field: &str) -> Vec<String> {
        self.fields(collection, id)
            .and_then(|fields| fields.get(field).cloned())
            .and_then(|v| v.as_array().cloned())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mount GET/PATCH handlers. Failure-injection mocks must be mounted
    /// before this so they match first until they expire.
    pub async fn mount(&self, server: &MockServer) {
        Mock::given(method("GET"))
            .respond_with(GetResponder(self.clone()))
            .mount(server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(PatchResponder(self.clone()))
            .mount(server)
            .await;
    }
}

pub struct GetResponder(InMemoryStore);

impl Respond for GetResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().to_string();
        match self.0.docs.lock().unwrap().get(&path) {
            Some((version, fields)) => ResponseTemplate::new(200).set_body_json(json!({
                "id": doc_id(&path),
                "version": version,
                "fields": fields,
            })),
            None => ResponseTemplate::new(404)
                .set_body_json(json!({ "error": format!("no document at {}", path) })),
        }
    }
}

pub struct PatchResponder(InMemoryStore);

impl Respond for PatchResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().to_string();
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(e) => {
                return ResponseTemplate::new(400)
                    .set_body_json(json!({ "error": format!("bad patch body: {}", e) }))
            }
        };

        let mut docs = self.0.docs.lock().unwrap();
        let entry = docs.entry(path.clone()).or_insert_with(|| (0, Fields::new()));

        if let Some(expected) = body.get("expected_version").and_then(|v| v.as_u64()) {
            if entry.0 != expected {
                return ResponseTemplate::new(409).set_body_json(json!({
                    "expected_version": expected,
                    "actual_version": entry.0,
                }));
            }
        }

        if let Some(fields) = body.get("fields").and_then(|v| v.as_object()) {
            for (key, value) in fields {
                entry.1.insert(key.clone(), value.clone());
            }
        }
        entry.0 += 1;

        ResponseTemplate::new(200).set_body_json(json!({
            "id": doc_id(&path),
            "version": entry.0,
            "fields": entry.1,
        }))
    }
}

fn doc_id(path: &str) -> String {
    path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Retry tunables scaled down so a full exhaustion run stays under 100ms.
#[allow(dead_code)]
pub fn fast_config(server: &MockServer) -> StoreConfig {
    StoreConfig {
        base_url: server.uri(),
        request_timeout_ms: 2_000,
        max_attempts: 3,
        retry_base_ms: 20,
        validate_retry_ms: 10,
        verify_interval_ms: 25,
    }
}

#[allow(dead_code)]
pub fn spawn_manager(server: &MockServer) -> (Arc<SocialManager>, mpsc::Receiver<Notification>) {
    settler::init_tracing();
    let (notifier, rx) = Notifier::channel();
    (SocialManager::new(fast_config(server), notifier), rx)
}
