pub mod client;
pub mod config;
pub mod social;
pub mod types;

use once_cell::sync::OnceCell;
use std::sync::Arc;

pub use client::StoreClient;
pub use config::StoreConfig;
pub use social::{SocialManager, POSTS, PROFILES};
pub use types::{Comment, DocumentEnvelope, PatchRequest};

static GLOBAL_SOCIAL_MANAGER: OnceCell<Arc<social::SocialManager>> = OnceCell::new();

/// Set the global social manager (called once during app startup)
pub fn set_global_manager(manager: Arc<social::SocialManager>) {
    let _ = GLOBAL_SOCIAL_MANAGER.set(manager);
}

/// Get the global social manager if one was installed
pub fn get_global_manager() -> Option<Arc<social::SocialManager>> {
    GLOBAL_SOCIAL_MANAGER.get().map(Arc::clone)
}
