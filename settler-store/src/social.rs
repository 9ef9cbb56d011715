//! Social-app mutations: profile saves, likes, comments, friend requests.
//!
//! Every operation follows the same shape: claim the target in the
//! in-flight registry (duplicate submissions return `None`), run the
//! executor against the document store, and push one notification per
//! terminal outcome. The caller owns the optimistic UI state and uses the
//! returned [`MutationOutcome`] to keep or revert it.

use crate::client::StoreClient;
use crate::config::StoreConfig;
use crate::types::{Comment, DocumentEnvelope};
use serde_json::json;
use settler::{
    BackoffPolicy, Executor, ExecutorOptions, InFlightRegistry, MutationError, MutationOutcome,
    MutationRequest, Notifier, Patch, Result,
};
use std::sync::Arc;
use std::time::Duration;

pub const PROFILES: &str = "profiles";
pub const POSTS: &str = "posts";

/// Orchestrates all social mutations against one document store.
pub struct SocialManager {
    store: Arc<StoreClient>,
    /// Linear-backoff executor for ordinary mutations.
    mutate_exec: Executor,
    /// Flat-backoff executor for validation-style saves (username).
    validate_exec: Executor,
    inflight: InFlightRegistry,
    notifier: Notifier,
}

impl SocialManager {
    pub fn new(config: StoreConfig, notifier: Notifier) -> Arc<Self> {
        let store = Arc::new(StoreClient::new(&config));

        // The outer attempt timeout trails the HTTP timeout so reqwest
        // classifies a hung call first.
        let attempt_timeout = Duration::from_millis(config.request_timeout_ms.saturating_add(1_000));

        let mutate_exec = Executor::new(ExecutorOptions {
            max_attempts: config.max_attempts,
            backoff: BackoffPolicy::linear_ms(config.retry_base_ms),
            attempt_timeout,
            verify_interval: Duration::from_millis(config.verify_interval_ms),
            ..ExecutorOptions::default()
        });

        let validate_exec = Executor::new(ExecutorOptions {
            max_attempts: config.max_attempts,
            backoff: BackoffPolicy::Fixed {
                delay: Duration::from_millis(config.validate_retry_ms),
            },
            attempt_timeout,
            ..ExecutorOptions::default()
        });

        Arc::new(Self {
            store,
            mutate_exec,
            validate_exec,
            inflight: InFlightRegistry::new(),
            notifier,
        })
    }

    pub fn in_flight(&self, collection: &str, id: &str) -> bool {
        self.inflight.in_flight(&format!("{}/{}", collection, id))
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<DocumentEnvelope> {
        self.store.get_document(PROFILES, user_id).await
    }

    pub async fn get_post(&self, post_id: &str) -> Result<DocumentEnvelope> {
        self.store.get_document(POSTS, post_id).await
    }

    /// Save profile fields with read-your-writes verification: a fresh
    /// sentinel is written alongside the patch and polled for afterwards.
    ///
    /// Returns `None` when a save for the same profile is already in
    /// flight.
    pub async fn save_profile(&self, user_id: &str, fields: Patch) -> Option<MutationOutcome> {
        let target = format!("{}/{}", PROFILES, user_id);
        let _guard = self.inflight.begin(target.clone())?;

        let token = uuid::Uuid::new_v4().to_string();
        let mut request = MutationRequest::new(target);
        request.patch = fields;
        request.patch.insert("refresh_token".to_string(), json!(token));

        let store = Arc::clone(&self.store);
        let user = user_id.to_string();
        let commit = move |req: MutationRequest| {
            let store = Arc::clone(&store);
            let user = user.clone();
            async move {
                let updated = store
                    .patch_document(PROFILES, &user, req.patch, req.expected_prior_version)
                    .await?;
                serde_json::to_value(updated).map(Some).map_err(Into::into)
            }
        };

        let store = Arc::clone(&self.store);
        let user = user_id.to_string();
        let verify = move || {
            let store = Arc::clone(&store);
            let user = user.clone();
            let token = token.clone();
            async move {
                let doc = store.get_document(PROFILES, &user).await?;
                Ok(doc.field("refresh_token").and_then(|v| v.as_str()) == Some(token.as_str()))
            }
        };

        let outcome = self
            .mutate_exec
            .execute_verified(request, commit, Some(verify))
            .await;
        self.report("save your profile", "Profile saved", &outcome);
        Some(outcome)
    }

    /// Username saves retry on the flat validation policy; a taken name
    /// comes back as a terminal validation rejection.
    pub async fn set_username(&self, user_id: &str, username: &str) -> Option<MutationOutcome> {
        let target = format!("{}/{}", PROFILES, user_id);
        let _guard = self.inflight.begin(target.clone())?;

        let request = MutationRequest::new(target).set("username", json!(username));

        let store = Arc::clone(&self.store);
        let user = user_id.to_string();
        let outcome = self
            .validate_exec
            .execute(request, move |req: MutationRequest| {
                let store = Arc::clone(&store);
                let user = user.clone();
                async move {
                    let updated = store
                        .patch_document(PROFILES, &user, req.patch, req.expected_prior_version)
                        .await?;
                    serde_json::to_value(updated).map(Some).map_err(Into::into)
                }
            })
            .await;
        self.report("change your username", "Username updated", &outcome);
        Some(outcome)
    }

    /// Flip `user_id`'s membership in the post's likes array.
    ///
    /// `current_likes` is the caller's loaded state, the same array the UI
    /// flipped optimistically. Two users toggling concurrently race with
    /// last-write-wins; on [`MutationOutcome::ExhaustedRetries`] the caller
    /// should reload the feed rather than trust its local copy.
    pub async fn toggle_like(
        &self,
        post_id: &str,
        user_id: &str,
        current_likes: &[String],
    ) -> Option<MutationOutcome> {
        let target = format!("{}/{}", POSTS, post_id);
        let _guard = self.inflight.begin(target.clone())?;

        let mut likes: Vec<String> = current_likes.to_vec();
        match likes.iter().position(|u| u == user_id) {
            Some(pos) => {
                likes.remove(pos);
            }
            None => likes.push(user_id.to_string()),
        }

        let request = MutationRequest::new(target).set("likes", json!(likes));
        let outcome = self.commit_post_patch(post_id, request).await;

        if let MutationOutcome::Rejected { reason } = &outcome {
            self.notifier.error(rejection_message("like this post", reason));
        }
        // Likes settle silently on success and on exhaustion: the UI either
        // keeps the flipped state or reloads the feed.
        Some(outcome)
    }

    /// Append a comment to the post's comments array.
    pub async fn add_comment(
        &self,
        post_id: &str,
        current_comments: &[Comment],
        comment: Comment,
    ) -> Option<MutationOutcome> {
        let target = format!("{}/{}", POSTS, post_id);
        let _guard = self.inflight.begin(target.clone())?;

        let mut comments: Vec<Comment> = current_comments.to_vec();
        comments.push(comment);

        let request = MutationRequest::new(target).set("comments", json!(comments));
        let outcome = self.commit_post_patch(post_id, request).await;
        self.report("post your comment", "Comment posted", &outcome);
        Some(outcome)
    }

    /// Add `from` to the recipient's pending requests.
    pub async fn send_friend_request(
        &self,
        from: &str,
        to: &str,
        current_pending: &[String],
    ) -> Option<MutationOutcome> {
        let target = format!("{}/{}", PROFILES, to);
        let _guard = self.inflight.begin(target.clone())?;

        let mut pending: Vec<String> = current_pending.to_vec();
        if pending.iter().any(|u| u == from) {
            // Re-sending is idempotent: the patch re-commits the same array.
            tracing::debug!("[SOCIAL] request from {} to {} already pending", from, to);
        } else {
            pending.push(from.to_string());
        }

        let request = MutationRequest::new(target).set("pending_requests", json!(pending));
        let outcome = self.commit_profile_patch(to, request).await;
        self.report("send the friend request", "Friend request sent", &outcome);
        Some(outcome)
    }

    /// Accept or decline a pending request: one patch removes it from
    /// `pending_requests` and, on accept, adds the sender to `friends`.
    pub async fn respond_friend_request(
        &self,
        user_id: &str,
        from: &str,
        accept: bool,
        current_pending: &[String],
        current_friends: &[String],
    ) -> Option<MutationOutcome> {
        let target = format!("{}/{}", PROFILES, user_id);
        let _guard = self.inflight.begin(target.clone())?;

        let pending: Vec<String> = current_pending
            .iter()
            .filter(|u| u.as_str() != from)
            .cloned()
            .collect();
        let mut friends: Vec<String> = current_friends.to_vec();
        if accept && !friends.iter().any(|u| u == from) {
            friends.push(from.to_string());
        }

        let request = MutationRequest::new(target)
            .set("pending_requests", json!(pending))
            .set("friends", json!(friends));
        let outcome = self.commit_profile_patch(user_id, request).await;

        let success_msg = if accept {
            "Friend request accepted"
        } else {
            "Friend request declined"
        };
        self.report("update the friend request", success_msg, &outcome);
        Some(outcome)
    }

    async fn commit_post_patch(&self, post_id: &str, request: MutationRequest) -> MutationOutcome {
        let store = Arc::clone(&self.store);
        let post = post_id.to_string();
        self.mutate_exec
            .execute(request, move |req: MutationRequest| {
                let store = Arc::clone(&store);
                let post = post.clone();
                async move {
                    let updated = store
                        .patch_document(POSTS, &post, req.patch, req.expected_prior_version)
                        .await?;
                    serde_json::to_value(updated).map(Some).map_err(Into::into)
                }
            })
            .await
    }

    async fn commit_profile_patch(
        &self,
        user_id: &str,
        request: MutationRequest,
    ) -> MutationOutcome {
        let store = Arc::clone(&self.store);
        let user = user_id.to_string();
        self.mutate_exec
            .execute(request, move |req: MutationRequest| {
                let store = Arc::clone(&store);
                let user = user.clone();
                async move {
                    let updated = store
                        .patch_document(PROFILES, &user, req.patch, req.expected_prior_version)
                        .await?;
                    serde_json::to_value(updated).map(Some).map_err(Into::into)
                }
            })
            .await
    }

    fn report(&self, action: &str, success_msg: &str, outcome: &MutationOutcome) {
        match outcome {
            MutationOutcome::Committed { .. } => self.notifier.success(success_msg),
            MutationOutcome::ExhaustedRetries { last_error, .. } => self.notifier.error(format!(
                "Could not {} after several tries: {}",
                action, last_error
            )),
            MutationOutcome::Rejected { reason } => {
                self.notifier.error(rejection_message(action, reason))
            }
        }
    }
}

/// Human-readable message per rejection cause.
fn rejection_message(action: &str, reason: &MutationError) -> String {
    match reason {
        MutationError::PermissionDenied(_) => {
            format!("You do not have permission to {}", action)
        }
        MutationError::Unauthenticated(_) => "Please sign in and try again".to_string(),
        MutationError::Validation(msg) => msg.clone(),
        MutationError::VersionConflict { .. } => {
            format!("Someone else updated this first. Reload and {} again", action)
        }
        MutationError::NotFound(_) => "That item no longer exists".to_string(),
        other => format!("Could not {}: {}", action, other),
    }
}
