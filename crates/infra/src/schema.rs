//! Table layout for the Postgres stores.
//!
//! `ensure_schema` is idempotent: tables are created if missing and the role
//! seed is inserted without touching rows that already exist.

use sqlx::PgPool;
use tracing::info;

use agora_auth::{ROLE_SEED, StoreError};

use crate::map_sqlx_error;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE,
        token TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        enabled BOOLEAN NOT NULL DEFAULT TRUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        slug TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_roles (
        user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        role_id INTEGER NOT NULL REFERENCES roles (id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (user_id, role_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS board_roles (
        user_id UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        board_id UUID NOT NULL,
        role_id INTEGER NOT NULL REFERENCES roles (id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        UNIQUE (user_id, board_id, role_id)
    )
    "#,
];

/// Create the access-control tables and seed the role catalog.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for ddl in TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }

    for seed in ROLE_SEED.iter() {
        sqlx::query(
            r#"
            INSERT INTO roles (id, name, slug, created_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(seed.id.get())
        .bind(seed.role.as_str())
        .bind(seed.slug)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("seed_roles", e))?;
    }

    info!(roles = ROLE_SEED.len(), "access-control schema ready");
    Ok(())
}
