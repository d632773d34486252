use std::sync::Arc;

use jsonwebtoken::DecodingKey;

use crate::scheduler::Scheduler;

/// Shared application state, injected into all route handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
    pub decoding_key: Arc<DecodingKey>,
}

impl AppState {
    /// `jwt_secret` is the HS256 key bearer tokens are signed with.
    pub fn new(scheduler: Arc<Scheduler>, jwt_secret: &str) -> Self {
        Self {
            scheduler,
            decoding_key: Arc::new(DecodingKey::from_secret(jwt_secret.as_bytes())),
        }
    }
}
