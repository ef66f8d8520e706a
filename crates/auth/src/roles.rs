use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use agora_core::RoleId;

/// Role name used for RBAC.
///
/// Roles are opaque names at the store boundary. The names below are the ones
/// the capability table knows about; any other name is carried through but
/// never grants anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

/// Where a role assignment applies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleScope {
    /// Site-wide grant stored against the user.
    Global,
    /// Grant stored against a `(user, board)` pair.
    Board,
}

impl Role {
    pub const USER_ADMIN: Role = Role(Cow::Borrowed("User Admin"));
    pub const SUPER_BOARD_ADMIN: Role = Role(Cow::Borrowed("Super Message Board Admin"));
    pub const BOARD_ADMIN: Role = Role(Cow::Borrowed("Board Admin"));
    pub const MODERATOR: Role = Role(Cow::Borrowed("Moderator"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Scope of a well-known role, `None` for names the backend does not know.
    pub fn scope(&self) -> Option<RoleScope> {
        ROLE_SEED
            .iter()
            .find(|seed| seed.role == *self)
            .map(|seed| seed.scope)
    }

    pub fn is_board_scoped(&self) -> bool {
        self.scope() == Some(RoleScope::Board)
    }

    /// Look up a seeded role by display name or slug (case-insensitive).
    pub fn seeded(name_or_slug: &str) -> Option<Role> {
        let wanted = name_or_slug.trim();
        ROLE_SEED
            .iter()
            .find(|seed| {
                seed.role.as_str().eq_ignore_ascii_case(wanted)
                    || seed.slug.eq_ignore_ascii_case(wanted)
            })
            .map(|seed| seed.role.clone())
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Legacy id of the "Board Admin" row in the `roles` table.
pub const BOARD_ADMIN_ROLE_ID: RoleId = RoleId::new(7);

/// A row of the `roles` table that must exist for the capability table to work.
#[derive(Debug, Clone)]
pub struct RoleSeed {
    pub id: RoleId,
    pub role: Role,
    pub slug: &'static str,
    pub scope: RoleScope,
}

/// Seed rows for the `roles` table, keyed by the legacy numbering.
pub static ROLE_SEED: [RoleSeed; 4] = [
    RoleSeed {
        id: RoleId::new(1),
        role: Role::USER_ADMIN,
        slug: "user-admin",
        scope: RoleScope::Global,
    },
    RoleSeed {
        id: RoleId::new(6),
        role: Role::SUPER_BOARD_ADMIN,
        slug: "super-message-board-admin",
        scope: RoleScope::Global,
    },
    RoleSeed {
        id: BOARD_ADMIN_ROLE_ID,
        role: Role::BOARD_ADMIN,
        slug: "board-admin",
        scope: RoleScope::Board,
    },
    RoleSeed {
        id: RoleId::new(8),
        role: Role::MODERATOR,
        slug: "moderator",
        scope: RoleScope::Board,
    },
];
