use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::{errors, services::AppServices};
use crate::context::RequestAuth;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<RequestAuth>,
) -> axum::response::Response {
    match services.engine.resolve(auth.token(), auth.cache()).await {
        Ok(identity) => Json(serde_json::json!({
            "user_id": identity.user_id.to_string(),
            "username": identity.username,
        }))
        .into_response(),
        Err(e) => errors::authz_error_to_response(e),
    }
}
