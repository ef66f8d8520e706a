//! Capability table: which role grants satisfy which capability.
//!
//! Capabilities are evaluated against a [`RoleSnapshot`] (the roles fetched for
//! one user, optionally scoped to one board). The table is data: adding a
//! scoped role or a capability means adding a row, not touching call sites.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::Role;

/// A named authorization question route handlers can ask.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    IsUserAdmin,
    IsSuperBoardAdmin,
    IsBoardAdmin,
    IsBoardModerator,
    CanAccessBoardDetails,
    CanBypassPostApproval,
}

/// One source of grant for a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// The user holds this site-wide role.
    Global(Role),
    /// The user holds this role on the board in scope.
    Scoped(Role),
    /// Another capability holds for the same user and board.
    Implied(Capability),
}

/// A row of the capability table.
#[derive(Debug, Clone)]
pub struct CapabilityRule {
    pub capability: Capability,
    /// Whether a board must be in scope to evaluate this capability.
    pub board_scoped: bool,
    /// Any satisfied grant grants the capability. There are no deny grants.
    pub grants: &'static [Grant],
}

pub static CAPABILITY_TABLE: [CapabilityRule; 6] = [
    CapabilityRule {
        capability: Capability::IsUserAdmin,
        board_scoped: false,
        grants: &[Grant::Global(Role::USER_ADMIN)],
    },
    CapabilityRule {
        capability: Capability::IsSuperBoardAdmin,
        board_scoped: false,
        grants: &[Grant::Global(Role::SUPER_BOARD_ADMIN)],
    },
    CapabilityRule {
        capability: Capability::IsBoardAdmin,
        board_scoped: true,
        grants: &[
            Grant::Scoped(Role::BOARD_ADMIN),
            Grant::Global(Role::SUPER_BOARD_ADMIN),
        ],
    },
    CapabilityRule {
        capability: Capability::IsBoardModerator,
        board_scoped: true,
        grants: &[Grant::Scoped(Role::MODERATOR)],
    },
    CapabilityRule {
        capability: Capability::CanAccessBoardDetails,
        board_scoped: true,
        grants: &[
            Grant::Implied(Capability::IsBoardAdmin),
            Grant::Global(Role::SUPER_BOARD_ADMIN),
        ],
    },
    CapabilityRule {
        capability: Capability::CanBypassPostApproval,
        board_scoped: true,
        grants: &[
            Grant::Implied(Capability::IsBoardModerator),
            Grant::Implied(Capability::CanAccessBoardDetails),
        ],
    },
];

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::IsUserAdmin,
        Capability::IsSuperBoardAdmin,
        Capability::IsBoardAdmin,
        Capability::IsBoardModerator,
        Capability::CanAccessBoardDetails,
        Capability::CanBypassPostApproval,
    ];

    pub fn rule(self) -> &'static CapabilityRule {
        // Every variant has exactly one row (checked in tests).
        CAPABILITY_TABLE
            .iter()
            .find(|rule| rule.capability == self)
            .unwrap_or_else(|| unreachable!("capability {self:?} missing from table"))
    }

    pub fn is_board_scoped(self) -> bool {
        self.rule().board_scoped
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::IsUserAdmin => "is_user_admin",
            Capability::IsSuperBoardAdmin => "is_super_board_admin",
            Capability::IsBoardAdmin => "is_board_admin",
            Capability::IsBoardModerator => "is_board_moderator",
            Capability::CanAccessBoardDetails => "can_access_board_details",
            Capability::CanBypassPostApproval => "can_bypass_post_approval",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Capability {
    type Err = agora_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| agora_core::DomainError::validation(format!("unknown capability '{s}'")))
    }
}

/// Outcome of a capability evaluation that could be determined.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Granted,
    Denied,
}

impl Decision {
    pub fn is_granted(self) -> bool {
        self == Decision::Granted
    }
}

impl From<bool> for Decision {
    fn from(granted: bool) -> Self {
        if granted { Decision::Granted } else { Decision::Denied }
    }
}

/// Roles held by one user: site-wide, plus those on the board in scope.
///
/// `scoped` is empty when no board is in scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSnapshot {
    pub global: HashSet<Role>,
    pub scoped: HashSet<Role>,
}

impl RoleSnapshot {
    pub fn new(global: HashSet<Role>, scoped: HashSet<Role>) -> Self {
        Self { global, scoped }
    }

    fn satisfies(&self, grant: &Grant, implied: &mut impl FnMut(Capability) -> Decision) -> bool {
        match grant {
            Grant::Global(role) => self.global.contains(role),
            Grant::Scoped(role) => self.scoped.contains(role),
            Grant::Implied(capability) => implied(*capability).is_granted(),
        }
    }
}

/// Evaluate a capability against a snapshot.
///
/// Every grant of the row is evaluated before the results are combined, so an
/// override grant never hides a scoped one (or vice versa). Implied
/// capabilities are looked up through `implied`, which lets callers memoize.
pub fn evaluate_with(
    capability: Capability,
    snapshot: &RoleSnapshot,
    mut implied: impl FnMut(Capability) -> Decision,
) -> Decision {
    let satisfied: Vec<bool> = capability
        .rule()
        .grants
        .iter()
        .map(|grant| snapshot.satisfies(grant, &mut implied))
        .collect();

    Decision::from(satisfied.into_iter().any(|s| s))
}

/// Evaluate a capability with no memoization.
pub fn evaluate(capability: Capability, snapshot: &RoleSnapshot) -> Decision {
    evaluate_with(capability, snapshot, |implied| evaluate(implied, snapshot))
}
