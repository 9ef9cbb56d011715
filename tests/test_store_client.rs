//! StoreClient against a wiremock-backed document store: envelope parsing,
//! version bumping, conflict detection, and transport-error classification.

use serde_json::json;
use settler::{MutationError, Patch};
use settler_store::{StoreClient, StoreConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn client_for(server: &MockServer) -> StoreClient {
    StoreClient::new(&common::fast_config(server))
}

fn patch_of(field: &str, value: serde_json::Value) -> Patch {
    let mut patch = Patch::new();
    patch.insert(field.to_string(), value);
    patch
}

#[tokio::test]
async fn get_document_parses_the_envelope() {
    let server = MockServer::start().await;
    let store = common::InMemoryStore::new();
    store.seed("profiles", "alice", json!({ "display_name": "Alice", "friends": ["bob"] }));
    store.mount(&server).await;

    let client = client_for(&server);
    let doc = client.get_document("profiles", "alice").await.unwrap();

    assert_eq!(doc.id, "alice");
    assert_eq!(doc.version, 1);
    assert_eq!(doc.field("display_name"), Some(&json!("Alice")));
    assert_eq!(doc.string_array("friends"), vec!["bob"]);
    assert!(client.last_success_timestamp() > 0);
}

#[tokio::test]
async fn patch_document_merges_fields_and_bumps_version() {
    let server = MockServer::start().await;
    let store = common::InMemoryStore::new();
    store.seed("profiles", "alice", json!({ "display_name": "Alice", "bio": "old" }));
    store.mount(&server).await;

    let client = client_for(&server);
    let updated = client
        .patch_document("profiles", "alice", patch_of("bio", json!("new")), None)
        .await
        .unwrap();

    assert_eq!(updated.version, 2);
    assert_eq!(updated.field("bio"), Some(&json!("new")));
    // Untouched fields survive a partial update.
    assert_eq!(updated.field("display_name"), Some(&json!("Alice")));
}

#[tokio::test]
async fn missing_document_maps_to_not_found() {
    let server = MockServer::start().await;
    common::InMemoryStore::new().mount(&server).await;

    let client = client_for(&server);
    let err = client.get_document("profiles", "ghost").await.unwrap_err();

    assert!(matches!(err, MutationError::NotFound(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn stale_expected_version_maps_to_conflict() {
    let server = MockServer::start().await;
    let store = common::InMemoryStore::new();
    store.seed("posts", "p1", json!({ "caption": "sunset" }));
    store.mount(&server).await;

    let client = client_for(&server);
    // Bump the stored version past what we claim to have seen.
    client
        .patch_document("posts", "p1", patch_of("caption", json!("dawn")), None)
        .await
        .unwrap();

    let err = client
        .patch_document("posts", "p1", patch_of("caption", json!("noon")), Some(1))
        .await
        .unwrap_err();

    match err {
        MutationError::VersionConflict { expected, actual } => {
            assert_eq!(expected, 1);
            assert_eq!(actual, Some(2));
        }
        other => panic!("expected VersionConflict, got {:?}", other),
    }
    // The conflicting write must not have landed.
    assert_eq!(
        store.fields("posts", "p1").unwrap().get("caption"),
        Some(&json!("dawn"))
    );
}

#[tokio::test]
async fn server_errors_classify_as_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/posts/p1"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": "maintenance" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .patch_document("posts", "p1", patch_of("caption", json!("x")), None)
        .await
        .unwrap_err();

    assert!(matches!(err, MutationError::Unavailable(ref m) if m == "maintenance"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn hung_backend_maps_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "p1", "version": 1, "fields": {} }))
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = StoreConfig {
        request_timeout_ms: 200,
        ..common::fast_config(&server)
    };
    let client = StoreClient::new(&config);
    let err = client.get_document("posts", "p1").await.unwrap_err();

    assert!(matches!(err, MutationError::Timeout { waited_ms: 200 }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unreachable_host_maps_to_network() {
    // Port 9 is discard; nothing is listening on this address in tests.
    let config = StoreConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        request_timeout_ms: 500,
        ..StoreConfig::default()
    };
    let client = StoreClient::new(&config);
    let err = client.get_document("posts", "p1").await.unwrap_err();

    assert!(err.is_retryable());
}
