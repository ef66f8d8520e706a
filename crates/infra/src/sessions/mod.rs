//! Session storage (`sessions` joined with `users`).

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemorySessionStore;
pub use postgres::PostgresSessionStore;

/// Fresh opaque session token.
pub(crate) fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
