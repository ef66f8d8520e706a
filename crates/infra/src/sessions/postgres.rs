//! Postgres-backed session store.
//!
//! Reads join `sessions` with `users`; only enabled sessions resolve. The
//! unique constraint on `sessions.user_id` makes sign-in an upsert, so a user
//! holds at most one live token.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use agora_auth::{Session, SessionStore, StoreError, User};
use agora_core::{SessionId, UserId};

use crate::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: Arc<PgPool>,
}

impl PostgresSessionStore {
    pub fn from_shared(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    // The token is a bearer secret; keep it out of spans.
    #[instrument(skip(self, token), err)]
    async fn user_by_session_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.password_hash, u.created_at, u.updated_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.enabled = TRUE
            "#,
        )
        .bind(token)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_session_token", e))?;

        row.map(|row| {
            UserRow::from_row(&row)
                .map(User::from)
                .map_err(|e| StoreError::unavailable(format!("failed to decode user row: {e}")))
        })
        .transpose()
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn upsert_session(&self, user_id: UserId) -> Result<Session, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, token, created_at, updated_at, enabled)
            VALUES ($1, $2, $3, now(), now(), TRUE)
            ON CONFLICT (user_id) DO UPDATE
                SET token = EXCLUDED.token,
                    updated_at = now(),
                    enabled = TRUE
            RETURNING id, user_id, token, created_at, updated_at, enabled
            "#,
        )
        .bind(SessionId::new().as_uuid())
        .bind(user_id.as_uuid())
        .bind(super::new_token())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_session", e))?;

        let session = SessionRow::from_row(&row)
            .map_err(|e| StoreError::unavailable(format!("failed to decode session row: {e}")))?;
        Ok(session.into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row types
// ─────────────────────────────────────────────────────────────────────────────

struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    token: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    enabled: bool,
}

impl<'r> FromRow<'r, PgRow> for SessionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(SessionRow {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            token: row.try_get("token")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            enabled: row.try_get("enabled")?,
        })
    }
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: SessionId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            token: row.token,
            created_at: row.created_at,
            updated_at: row.updated_at,
            enabled: row.enabled,
        }
    }
}
