use std::sync::Arc;

use agora_auth::PermissionCache;

/// Per-request authentication context.
///
/// Carries the raw session token (if the client sent one) and the permission
/// cache shared by every check made while handling this request. The cache is
/// created by the session middleware and dropped with the request.
#[derive(Debug, Clone)]
pub struct RequestAuth {
    token: Option<String>,
    cache: Arc<PermissionCache>,
}

impl RequestAuth {
    pub fn new(token: Option<String>, cache: Arc<PermissionCache>) -> Self {
        Self { token, cache }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }
}
