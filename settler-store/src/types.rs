use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use settler::Patch;

/// A document as the store returns it: id, monotonically increasing
/// version, and the field map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEnvelope {
    pub id: String,
    pub version: u64,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl DocumentEnvelope {
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }

    /// String-array field helper; `likes`, `friends`, and
    /// `pending_requests` are all stored this way.
    pub fn string_array(&self, name: &str) -> Vec<String> {
        self.fields
            .get(name)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Body of a partial update request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchRequest {
    pub fields: Patch,
    /// When set, the store must fail with a conflict unless the stored
    /// version still matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

/// A single comment on a post, stored inside the post's `comments` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Comment {
            author: author.into(),
            text: text.into(),
            posted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_field_helpers() {
        let envelope: DocumentEnvelope = serde_json::from_value(json!({
            "id": "post-1",
            "version": 3,
            "fields": {
                "caption": "sunset",
                "likes": ["alice", "bob", 7]
            }
        }))
        .unwrap();

        assert_eq!(envelope.field("caption"), Some(&json!("sunset")));
        // Non-string entries are skipped rather than failing the whole read.
        assert_eq!(envelope.string_array("likes"), vec!["alice", "bob"]);
        assert!(envelope.string_array("comments").is_empty());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let envelope: DocumentEnvelope =
            serde_json::from_value(json!({ "id": "p", "version": 0 })).unwrap();
        assert!(envelope.fields.is_empty());
    }

    #[test]
    fn patch_request_omits_unset_version() {
        let body = PatchRequest {
            fields: Patch::new(),
            expected_version: None,
        };
        let text = serde_json::to_string(&body).unwrap();
        assert!(!text.contains("expected_version"));
    }
}
