//! Board-scoped endpoints: capability checks and role grants.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use agora_auth::{AuthzError, Capability};
use agora_core::{BoardId, UserId};

use crate::app::{errors, services::AppServices};
use crate::context::RequestAuth;

// ─────────────────────────────────────────────────────────────────────────────
// Request bodies
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GrantRoleRequest {
    pub user_id: String,
    pub role: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /boards/:board_id/capabilities/:capability
pub async fn check_capability(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<RequestAuth>,
    Path((board_id, capability)): Path<(String, String)>,
) -> axum::response::Response {
    let (board_id, capability) = match parse_board(&board_id)
        .and_then(|b| Ok((b, Capability::from_str(&capability)?)))
    {
        Ok(parsed) => parsed,
        Err(e) => return errors::authz_error_to_response(e),
    };

    let outcome = services
        .engine
        .authorize(auth.token(), Some(board_id), capability, auth.cache())
        .await;
    if let Err(response) = errors::require(outcome) {
        return response;
    }

    Json(serde_json::json!({
        "granted": true,
        "board_id": board_id.to_string(),
        "capability": capability.as_str(),
    }))
    .into_response()
}

/// POST /boards/:board_id/roles
///
/// The caller must be a board admin of this board (super admins qualify).
/// Granting a role the user already holds succeeds without a second row.
pub async fn grant_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(auth): Extension<RequestAuth>,
    Path(board_id): Path<String>,
    Json(req): Json<GrantRoleRequest>,
) -> axum::response::Response {
    let board_id = match parse_board(&board_id) {
        Ok(b) => b,
        Err(e) => return errors::authz_error_to_response(e),
    };

    let outcome = services
        .engine
        .authorize(
            auth.token(),
            Some(board_id),
            Capability::IsBoardAdmin,
            auth.cache(),
        )
        .await;
    if let Err(response) = errors::require(outcome) {
        return response;
    }

    let user_id = match UserId::from_str(&req.user_id) {
        Ok(u) => u,
        Err(e) => return errors::authz_error_to_response(e.into()),
    };
    let role = match errors::parse_role(&req.role) {
        Ok(r) => r,
        Err(response) => return response,
    };

    if let Err(e) = services
        .engine
        .catalog()
        .grant_board_role(user_id, board_id, &role)
        .await
    {
        return errors::authz_error_to_response(e);
    }

    Json(serde_json::json!({
        "status": "ok",
        "user_id": user_id.to_string(),
        "board_id": board_id.to_string(),
        "role": role.as_str(),
    }))
    .into_response()
}

fn parse_board(raw: &str) -> Result<BoardId, AuthzError> {
    Ok(BoardId::from_str(raw)?)
}
