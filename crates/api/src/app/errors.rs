use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use agora_auth::{AuthzError, AuthzOutcome, Role};

const DENIED_MESSAGE: &str = "You do not have permission to perform this action.";
const UNAVAILABLE_MESSAGE: &str = "Something went wrong. Please try again later.";

/// Map an authorization outcome to the response a handler should return.
///
/// `Ok(())` means granted and the handler proceeds. Infrastructure details are
/// logged and never written to the body.
pub fn require(outcome: AuthzOutcome) -> Result<(), axum::response::Response> {
    match outcome {
        AuthzOutcome::Granted => Ok(()),
        AuthzOutcome::Denied => Err(json_error(StatusCode::FORBIDDEN, "forbidden", DENIED_MESSAGE)),
        AuthzOutcome::SessionMissing => Err(session_missing()),
        AuthzOutcome::Unavailable(err) => {
            tracing::error!(error = %err, "authorization could not be decided");
            Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                UNAVAILABLE_MESSAGE,
            ))
        }
        AuthzOutcome::Invalid(msg) => {
            Err(json_error(StatusCode::BAD_REQUEST, "validation_error", msg))
        }
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    match require(AuthzOutcome::from(Err(err))) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(response) => response,
    }
}

/// Legacy shape: clients expect HTTP 200 with an error status in the body.
pub fn session_missing() -> axum::response::Response {
    (
        StatusCode::OK,
        axum::Json(json!({
            "status": "error",
            "error": "session_missing",
            "message": "Your session is missing or has expired. Please sign in.",
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_role(s: &str) -> Result<Role, axum::response::Response> {
    Role::seeded(s).ok_or_else(|| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_role",
            "role must be one of: board-admin, moderator",
        )
    })
}
