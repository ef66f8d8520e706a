//! Role assignment storage (`roles`, `user_roles`, `board_roles`).

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryRoleStore;
pub use postgres::PostgresRoleStore;
