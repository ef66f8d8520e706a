use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use agora_auth::PermissionCache;

use crate::context::RequestAuth;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub cookie_name: Arc<str>,
}

impl SessionState {
    pub fn new(cookie_name: impl Into<Arc<str>>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }
}

/// Attach a [`RequestAuth`] with a fresh permission cache to every request.
///
/// A missing token is not rejected here; handlers decide what an anonymous
/// caller may do. The cache is cleared once the response is produced.
pub async fn session_middleware(
    State(state): State<SessionState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = extract_session_token(req.headers(), &state.cookie_name);
    let cache = Arc::new(PermissionCache::new());

    req.extensions_mut()
        .insert(RequestAuth::new(token, Arc::clone(&cache)));

    let response = next.run(req).await;
    cache.clear();
    response
}

/// Session cookie first, then `Authorization: Bearer`.
fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    from_cookie(headers, cookie_name).or_else(|| from_bearer(headers))
}

fn from_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn from_bearer(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}
