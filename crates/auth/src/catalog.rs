//! Role catalog: reads and writes of global and board-scoped role assignments.

use std::collections::HashSet;

use agora_core::{BoardId, UserId};

use crate::authorize::AuthzError;
use crate::store::{RoleStore, StoreError};
use crate::Role;

#[derive(Debug, Clone)]
pub struct RoleCatalog<R> {
    store: R,
}

impl<R: RoleStore> RoleCatalog<R> {
    pub fn new(store: R) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// All site-wide roles held by the user (deduplicated).
    pub async fn global_roles(&self, user_id: UserId) -> Result<HashSet<Role>, StoreError> {
        Ok(self.store.global_roles(user_id).await?.into_iter().collect())
    }

    /// Scoped roles held on one board. Distinct grants coexist, so this is a
    /// set; an empty set means no scoped role.
    pub async fn board_roles(
        &self,
        user_id: UserId,
        board_id: BoardId,
    ) -> Result<HashSet<Role>, StoreError> {
        Ok(self
            .store
            .board_roles(user_id, board_id)
            .await?
            .into_iter()
            .collect())
    }

    /// Grant a board-scoped role. Repeating the same grant is a no-op.
    ///
    /// Only board-scoped roles may be granted here; global roles are rejected
    /// as a validation error before the store is touched.
    pub async fn grant_board_role(
        &self,
        user_id: UserId,
        board_id: BoardId,
        role: &Role,
    ) -> Result<(), AuthzError> {
        if !role.is_board_scoped() {
            return Err(AuthzError::Validation(format!(
                "'{role}' is not a board-scoped role"
            )));
        }

        self.store
            .grant_board_role(user_id, board_id, role)
            .await
            .map_err(|e| match e {
                StoreError::UnknownRole(name) => {
                    AuthzError::Validation(format!("role '{name}' is not seeded"))
                }
                other => AuthzError::StoreUnavailable(other),
            })?;

        tracing::info!(%user_id, %board_id, role = %role, "board role granted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct FakeRoles {
        global: Mutex<HashMap<UserId, Vec<Role>>>,
        grants: Mutex<Vec<(UserId, BoardId, Role)>>,
        missing_seed: bool,
    }

    #[async_trait]
    impl RoleStore for FakeRoles {
        async fn global_roles(&self, user_id: UserId) -> Result<Vec<Role>, StoreError> {
            Ok(self.global.lock().unwrap().get(&user_id).cloned().unwrap_or_default())
        }

        async fn board_roles(
            &self,
            user_id: UserId,
            board_id: BoardId,
        ) -> Result<Vec<Role>, StoreError> {
            Ok(self
                .grants
                .lock()
                .unwrap()
                .iter()
                .filter(|(u, b, _)| *u == user_id && *b == board_id)
                .map(|(_, _, r)| r.clone())
                .collect())
        }

        async fn grant_board_role(
            &self,
            user_id: UserId,
            board_id: BoardId,
            role: &Role,
        ) -> Result<(), StoreError> {
            if self.missing_seed {
                return Err(StoreError::UnknownRole(role.to_string()));
            }
            // Keeps duplicates; only reads through the catalog collapse them.
            self.grants.lock().unwrap().push((user_id, board_id, role.clone()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn global_roles_are_deduplicated() {
        let store = FakeRoles::default();
        let user = UserId::new();
        store
            .global
            .lock()
            .unwrap()
            .insert(user, vec![Role::USER_ADMIN, Role::USER_ADMIN, Role::SUPER_BOARD_ADMIN]);
        let catalog = RoleCatalog::new(store);

        let roles = catalog.global_roles(user).await.unwrap();
        assert_eq!(roles.len(), 2);
        assert!(roles.contains(&Role::USER_ADMIN));
    }

    #[tokio::test]
    async fn board_roles_are_scoped_to_the_board() {
        let catalog = RoleCatalog::new(FakeRoles::default());
        let (user, board, other) = (UserId::new(), BoardId::new(), BoardId::new());

        catalog.grant_board_role(user, board, &Role::MODERATOR).await.unwrap();
        catalog.grant_board_role(user, board, &Role::BOARD_ADMIN).await.unwrap();

        let roles = catalog.board_roles(user, board).await.unwrap();
        assert_eq!(roles, HashSet::from([Role::MODERATOR, Role::BOARD_ADMIN]));
        assert!(catalog.board_roles(user, other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_grant_reads_back_once() {
        let catalog = RoleCatalog::new(FakeRoles::default());
        let (user, board) = (UserId::new(), BoardId::new());

        catalog.grant_board_role(user, board, &Role::MODERATOR).await.unwrap();
        catalog.grant_board_role(user, board, &Role::MODERATOR).await.unwrap();

        assert_eq!(catalog.store().grants.lock().unwrap().len(), 2);
        assert_eq!(
            catalog.board_roles(user, board).await.unwrap(),
            HashSet::from([Role::MODERATOR])
        );
    }

    #[tokio::test]
    async fn missing_role_seed_is_a_validation_error() {
        let catalog = RoleCatalog::new(FakeRoles {
            missing_seed: true,
            ..Default::default()
        });

        let err = catalog
            .grant_board_role(UserId::new(), BoardId::new(), &Role::MODERATOR)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthzError::Validation(_)));
    }

    #[tokio::test]
    async fn granting_a_global_role_is_rejected() {
        let catalog = RoleCatalog::new(FakeRoles::default());
        let err = catalog
            .grant_board_role(UserId::new(), BoardId::new(), &Role::SUPER_BOARD_ADMIN)
            .await
            .unwrap_err();

        assert!(matches!(err, AuthzError::Validation(_)));
        assert!(catalog.store().grants.lock().unwrap().is_empty());
    }
}
