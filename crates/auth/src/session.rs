//! Session rows and token → identity resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use agora_core::{SessionId, UserId};

use crate::store::{SessionStore, StoreError};
use crate::Identity;

/// A sign-in session. At most one exists per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub enabled: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No token was presented.
    #[error("no session token")]
    NoSession,

    /// A token was presented but no enabled session (or its user) exists.
    #[error("session not found")]
    SessionNotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Maps a session token to the identity of its user.
///
/// Read-only: resolving never touches session state, so it is safe to call any
/// number of times per request.
#[derive(Debug, Clone)]
pub struct SessionResolver<S> {
    store: S,
}

impl<S: SessionStore> SessionResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn resolve(&self, token: Option<&str>) -> Result<Identity, ResolveError> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(ResolveError::NoSession),
        };

        match self.store.user_by_session_token(token).await? {
            Some(user) => Ok(Identity::from(&user)),
            None => Err(ResolveError::SessionNotFound),
        }
    }
}
