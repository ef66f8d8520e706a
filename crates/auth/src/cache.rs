//! Request-scoped memoization of identities, role fetches and decisions.
//!
//! A `PermissionCache` lives exactly as long as one inbound request. The HTTP
//! boundary creates a fresh one per request and drops it with the request, so a
//! decision can never outlive the grants it was computed from.
//!
//! Only successful lookups are stored; failures are always re-attempted.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use agora_core::{BoardId, UserId};

use crate::{Capability, Decision, Identity, Role};

type DecisionKey = (UserId, Option<BoardId>, Capability);

#[derive(Debug, Default)]
pub struct PermissionCache {
    identities: Mutex<HashMap<String, Identity>>,
    global_roles: Mutex<HashMap<UserId, Arc<HashSet<Role>>>>,
    board_roles: Mutex<HashMap<(UserId, BoardId), Arc<HashSet<Role>>>>,
    decisions: Mutex<HashMap<DecisionKey, Decision>>,
}

impl PermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identity(&self, token: &str) -> Option<Identity> {
        self.identities.lock().ok()?.get(token).cloned()
    }

    pub fn store_identity(&self, token: &str, identity: Identity) {
        if let Ok(mut map) = self.identities.lock() {
            map.insert(token.to_string(), identity);
        }
    }

    pub fn global_roles(&self, user_id: UserId) -> Option<Arc<HashSet<Role>>> {
        self.global_roles.lock().ok()?.get(&user_id).cloned()
    }

    pub fn store_global_roles(&self, user_id: UserId, roles: Arc<HashSet<Role>>) {
        if let Ok(mut map) = self.global_roles.lock() {
            map.insert(user_id, roles);
        }
    }

    pub fn board_roles(&self, user_id: UserId, board_id: BoardId) -> Option<Arc<HashSet<Role>>> {
        self.board_roles.lock().ok()?.get(&(user_id, board_id)).cloned()
    }

    pub fn store_board_roles(&self, user_id: UserId, board_id: BoardId, roles: Arc<HashSet<Role>>) {
        if let Ok(mut map) = self.board_roles.lock() {
            map.insert((user_id, board_id), roles);
        }
    }

    pub fn decision(
        &self,
        user_id: UserId,
        board_id: Option<BoardId>,
        capability: Capability,
    ) -> Option<Decision> {
        self.decisions
            .lock()
            .ok()?
            .get(&(user_id, board_id, capability))
            .copied()
    }

    pub fn store_decision(
        &self,
        user_id: UserId,
        board_id: Option<BoardId>,
        capability: Capability,
        decision: Decision,
    ) {
        if let Ok(mut map) = self.decisions.lock() {
            map.insert((user_id, board_id, capability), decision);
        }
    }

    /// Forget everything. Called by the boundary when the request completes.
    pub fn clear(&self) {
        if let Ok(mut map) = self.identities.lock() {
            map.clear();
        }
        if let Ok(mut map) = self.global_roles.lock() {
            map.clear();
        }
        if let Ok(mut map) = self.board_roles.lock() {
            map.clear();
        }
        if let Ok(mut map) = self.decisions.lock() {
            map.clear();
        }
    }
}
