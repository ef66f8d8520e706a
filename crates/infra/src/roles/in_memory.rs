use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use agora_auth::{Role, RoleStore, StoreError};
use agora_core::{BoardId, UserId};

/// In-memory role store for tests/dev.
///
/// Board grants live in a set keyed by `(user, board, role)`, mirroring the
/// unique constraint on `board_roles`, so repeated grants collapse to one row.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    global: RwLock<HashMap<UserId, HashSet<Role>>>,
    board: RwLock<HashSet<(UserId, BoardId, Role)>>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give a user a site-wide role (administrative seeding for dev/tests).
    pub fn assign_global_role(&self, user_id: UserId, role: Role) -> Result<(), StoreError> {
        let mut global = self
            .global
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        global.entry(user_id).or_default().insert(role);
        Ok(())
    }

    /// Number of stored board grants across all users and boards.
    pub fn board_grant_count(&self) -> usize {
        self.board.read().map(|b| b.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn global_roles(&self, user_id: UserId) -> Result<Vec<Role>, StoreError> {
        let global = self
            .global
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        Ok(global
            .get(&user_id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn board_roles(
        &self,
        user_id: UserId,
        board_id: BoardId,
    ) -> Result<Vec<Role>, StoreError> {
        let board = self
            .board
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        Ok(board
            .iter()
            .filter(|(u, b, _)| *u == user_id && *b == board_id)
            .map(|(_, _, role)| role.clone())
            .collect())
    }

    async fn grant_board_role(
        &self,
        user_id: UserId,
        board_id: BoardId,
        role: &Role,
    ) -> Result<(), StoreError> {
        if role.scope().is_none() {
            return Err(StoreError::UnknownRole(role.to_string()));
        }

        let mut board = self
            .board
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        board.insert((user_id, board_id, role.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agora_auth::RoleCatalog;

    use super::*;

    #[tokio::test]
    async fn granting_twice_stores_one_row() {
        let store = InMemoryRoleStore::new();
        let (user, board) = (UserId::new(), BoardId::new());

        store.grant_board_role(user, board, &Role::BOARD_ADMIN).await.unwrap();
        store.grant_board_role(user, board, &Role::BOARD_ADMIN).await.unwrap();

        assert_eq!(store.board_grant_count(), 1);
        assert_eq!(
            store.board_roles(user, board).await.unwrap(),
            vec![Role::BOARD_ADMIN]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_grants_converge_to_one_row() {
        let catalog = Arc::new(RoleCatalog::new(InMemoryRoleStore::new()));
        let (user, board) = (UserId::new(), BoardId::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let catalog = catalog.clone();
                tokio::spawn(async move {
                    catalog.grant_board_role(user, board, &Role::MODERATOR).await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(catalog.store().board_grant_count(), 1);
    }

    #[tokio::test]
    async fn moderator_and_board_admin_coexist() {
        let store = InMemoryRoleStore::new();
        let (user, board) = (UserId::new(), BoardId::new());

        store.grant_board_role(user, board, &Role::MODERATOR).await.unwrap();
        store.grant_board_role(user, board, &Role::BOARD_ADMIN).await.unwrap();

        let roles: HashSet<Role> =
            store.board_roles(user, board).await.unwrap().into_iter().collect();
        assert_eq!(roles, HashSet::from([Role::MODERATOR, Role::BOARD_ADMIN]));
    }

    #[tokio::test]
    async fn unknown_role_is_not_granted() {
        let store = InMemoryRoleStore::new();
        let err = store
            .grant_board_role(UserId::new(), BoardId::new(), &Role::new("Janitor"))
            .await;
        assert_eq!(err, Err(StoreError::UnknownRole("Janitor".to_string())));
        assert_eq!(store.board_grant_count(), 0);
    }

    #[tokio::test]
    async fn global_roles_are_per_user() {
        let store = InMemoryRoleStore::new();
        let (alice, bob) = (UserId::new(), UserId::new());
        store.assign_global_role(alice, Role::USER_ADMIN).unwrap();

        assert_eq!(store.global_roles(alice).await.unwrap(), vec![Role::USER_ADMIN]);
        assert!(store.global_roles(bob).await.unwrap().is_empty());
    }
}
