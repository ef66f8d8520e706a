//! Storage contracts consumed by the access-control core.
//!
//! Implementations live in `agora-infra` (in-memory for tests/dev, Postgres for
//! production). Absence is always signaled with `Option`/empty collections;
//! `Err` is reserved for "could not determine".

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use agora_core::{BoardId, UserId};

use crate::{Role, Session, User};

/// Infrastructure failure while reaching session or role data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store call timed out")]
    Timeout,

    /// The role has no row in `roles`; the request named something the
    /// backend does not know, the store itself is fine.
    #[error("role '{0}' is not seeded")]
    UnknownRole(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Session persistence (`sessions` joined with `users`).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the user owning the enabled session with this token.
    ///
    /// Returns `Ok(None)` when no enabled session matches or the linked user row
    /// is missing.
    async fn user_by_session_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    /// Create the session for a user, replacing any previous one (conflict on
    /// `user_id`). The previous token stops resolving.
    async fn upsert_session(&self, user_id: UserId) -> Result<Session, StoreError>;
}

/// Global and board-scoped role assignments (`roles`, `user_roles`, `board_roles`).
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn global_roles(&self, user_id: UserId) -> Result<Vec<Role>, StoreError>;

    async fn board_roles(&self, user_id: UserId, board_id: BoardId)
    -> Result<Vec<Role>, StoreError>;

    /// Insert a scoped grant; an existing identical grant is left untouched.
    async fn grant_board_role(
        &self,
        user_id: UserId,
        board_id: BoardId,
        role: &Role,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    async fn user_by_session_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        (**self).user_by_session_token(token).await
    }

    async fn upsert_session(&self, user_id: UserId) -> Result<Session, StoreError> {
        (**self).upsert_session(user_id).await
    }
}

#[async_trait]
impl<S> RoleStore for Arc<S>
where
    S: RoleStore + ?Sized,
{
    async fn global_roles(&self, user_id: UserId) -> Result<Vec<Role>, StoreError> {
        (**self).global_roles(user_id).await
    }

    async fn board_roles(
        &self,
        user_id: UserId,
        board_id: BoardId,
    ) -> Result<Vec<Role>, StoreError> {
        (**self).board_roles(user_id, board_id).await
    }

    async fn grant_board_role(
        &self,
        user_id: UserId,
        board_id: BoardId,
        role: &Role,
    ) -> Result<(), StoreError> {
        (**self).grant_board_role(user_id, board_id, role).await
    }
}

/// Run a store call under an optional deadline; an elapsed deadline becomes
/// `StoreError::Timeout`. The inner future is dropped on timeout.
pub async fn with_deadline<T, E, F>(deadline: Option<Duration>, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: From<StoreError>,
{
    match deadline {
        Some(d) => match tokio::time::timeout(d, fut).await {
            Ok(result) => result,
            Err(_elapsed) => Err(StoreError::Timeout.into()),
        },
        None => fut.await,
    }
}
