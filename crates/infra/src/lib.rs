//! Infrastructure layer: storage adapters for sessions and role assignments.

pub mod roles;
pub mod schema;
pub mod sessions;

pub use roles::{InMemoryRoleStore, PostgresRoleStore};
pub use schema::ensure_schema;
pub use sessions::{InMemorySessionStore, PostgresSessionStore};

/// Map a sqlx error to the store error the access-control core understands.
///
/// Every database failure is "unavailable" from the engine's point of view; the
/// operation name is kept for logs only.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> agora_auth::StoreError {
    let msg = match err {
        sqlx::Error::Database(db_err) => {
            format!("database error in {}: {}", operation, db_err.message())
        }
        sqlx::Error::PoolClosed => format!("connection pool closed in {}", operation),
        sqlx::Error::PoolTimedOut => format!("connection pool timed out in {}", operation),
        other => format!("sqlx error in {}: {}", operation, other),
    };
    tracing::error!(operation, "{msg}");
    agora_auth::StoreError::Unavailable(msg)
}
