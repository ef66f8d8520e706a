//! `agora-auth`: session resolution and board/site role authorization.
//!
//! This crate is decoupled from HTTP and from any particular database: stores
//! are consumed through the traits in [`store`] and injected at construction.

pub mod authorize;
pub mod cache;
pub mod capability;
pub mod catalog;
pub mod principal;
pub mod roles;
pub mod session;
pub mod store;

pub use authorize::{AuthorizationEngine, AuthzError, AuthzOutcome, EngineConfig};
pub use cache::PermissionCache;
pub use capability::{Capability, Decision, Grant, RoleSnapshot, evaluate};
pub use catalog::RoleCatalog;
pub use principal::{Identity, User};
pub use roles::{BOARD_ADMIN_ROLE_ID, ROLE_SEED, Role, RoleScope, RoleSeed};
pub use session::{ResolveError, Session, SessionResolver};
pub use store::{RoleStore, SessionStore, StoreError};
