//! Postgres-backed role store.
//!
//! Role names live in `roles`; assignments reference them by id through
//! `user_roles` (site-wide) and `board_roles` (per board).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use agora_auth::{Role, RoleStore, StoreError};
use agora_core::{BoardId, UserId};

use crate::map_sqlx_error;

#[derive(Debug, Clone)]
pub struct PostgresRoleStore {
    pool: Arc<PgPool>,
}

impl PostgresRoleStore {
    pub fn from_shared(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn role_names(
        operation: &str,
        rows: Vec<sqlx::postgres::PgRow>,
    ) -> Result<Vec<Role>, StoreError> {
        rows.into_iter()
            .map(|row| {
                row.try_get::<String, _>("name")
                    .map(Role::new)
                    .map_err(|e| map_sqlx_error(operation, e))
            })
            .collect()
    }
}

#[async_trait]
impl RoleStore for PostgresRoleStore {
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn global_roles(&self, user_id: UserId) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("global_roles", e))?;

        Self::role_names("global_roles", rows)
    }

    #[instrument(skip(self), fields(user_id = %user_id, board_id = %board_id), err)]
    async fn board_roles(
        &self,
        user_id: UserId,
        board_id: BoardId,
    ) -> Result<Vec<Role>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT r.name
            FROM board_roles br
            JOIN roles r ON r.id = br.role_id
            WHERE br.user_id = $1 AND br.board_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(board_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("board_roles", e))?;

        Self::role_names("board_roles", rows)
    }

    #[instrument(
        skip(self),
        fields(user_id = %user_id, board_id = %board_id, role = %role),
        err
    )]
    async fn grant_board_role(
        &self,
        user_id: UserId,
        board_id: BoardId,
        role: &Role,
    ) -> Result<(), StoreError> {
        let role_id: Option<i32> = sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
            .bind(role.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("grant_board_role", e))?;

        let Some(role_id) = role_id else {
            return Err(StoreError::UnknownRole(role.to_string()));
        };

        // Unique on (user_id, board_id, role_id): a repeat grant is a no-op.
        sqlx::query(
            r#"
            INSERT INTO board_roles (user_id, board_id, role_id, created_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (user_id, board_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(board_id.as_uuid())
        .bind(role_id)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("grant_board_role", e))?;

        Ok(())
    }
}
