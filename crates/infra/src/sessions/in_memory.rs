use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use agora_auth::{Session, SessionStore, StoreError, User};
use agora_core::{SessionId, UserId};

/// In-memory session store.
///
/// Intended for tests/dev. Sessions are keyed by user, which is what enforces
/// the one-session-per-user invariant (the Postgres store uses a unique
/// constraint on `user_id` for the same effect).
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    users: RwLock<HashMap<UserId, User>>,
    sessions: RwLock<HashMap<UserId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user (user management is owned elsewhere; this is for dev/tests).
    pub fn insert_user(&self, username: impl Into<String>) -> Result<User, StoreError> {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username: username.into(),
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        };

        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        if users.values().any(|u| u.username == user.username) {
            return Err(StoreError::unavailable(format!(
                "username '{}' already taken",
                user.username
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Flip a user's session to disabled without deleting it.
    pub fn disable_session(&self, user_id: UserId) -> Result<(), StoreError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        if let Some(session) = sessions.get_mut(&user_id) {
            session.enabled = false;
            session.updated_at = Utc::now();
        }
        Ok(())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn user_by_session_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        let Some(session) = sessions.values().find(|s| s.enabled && s.token == token) else {
            return Ok(None);
        };

        let users = self
            .users
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        Ok(users.get(&session.user_id).cloned())
    }

    async fn upsert_session(&self, user_id: UserId) -> Result<Session, StoreError> {
        let known_user = self
            .users
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?
            .contains_key(&user_id);
        if !known_user {
            return Err(StoreError::unavailable(format!("no user row for {user_id}")));
        }

        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;

        let now = Utc::now();
        let session = match sessions.get(&user_id) {
            Some(existing) => Session {
                token: super::new_token(),
                updated_at: now,
                enabled: true,
                ..existing.clone()
            },
            None => Session {
                id: SessionId::new(),
                user_id,
                token: super::new_token(),
                created_at: now,
                updated_at: now,
                enabled: true,
            },
        };
        sessions.insert(user_id, session.clone());
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_resolves_to_its_user() {
        let store = InMemorySessionStore::new();
        let alice = store.insert_user("alice").unwrap();
        let session = store.upsert_session(alice.id).await.unwrap();

        let found = store.user_by_session_token(&session.token).await.unwrap();
        assert_eq!(found, Some(alice));
        assert_eq!(store.user_by_session_token("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn signing_in_again_replaces_the_previous_session() {
        let store = InMemorySessionStore::new();
        let bob = store.insert_user("bob").unwrap();

        let first = store.upsert_session(bob.id).await.unwrap();
        let second = store.upsert_session(bob.id).await.unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(first.id, second.id);
        assert_eq!(store.session_count(), 1);
        assert_eq!(store.user_by_session_token(&first.token).await.unwrap(), None);
        assert_eq!(
            store.user_by_session_token(&second.token).await.unwrap().map(|u| u.id),
            Some(bob.id)
        );
    }

    #[tokio::test]
    async fn disabled_session_does_not_resolve() {
        let store = InMemorySessionStore::new();
        let carol = store.insert_user("carol").unwrap();
        let session = store.upsert_session(carol.id).await.unwrap();

        store.disable_session(carol.id).unwrap();

        assert_eq!(store.user_by_session_token(&session.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn session_for_unknown_user_is_rejected() {
        let store = InMemorySessionStore::new();
        assert!(store.upsert_session(UserId::new()).await.is_err());
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn usernames_are_unique() {
        let store = InMemorySessionStore::new();
        store.insert_user("dave").unwrap();
        assert!(store.insert_user("dave").is_err());
    }
}
