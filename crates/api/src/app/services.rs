//! Store wiring: in-memory for dev/tests, Postgres when persistent stores are on.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use agora_auth::{AuthorizationEngine, EngineConfig, RoleStore, SessionStore, StoreError};
use agora_infra::{
    InMemoryRoleStore, InMemorySessionStore, PostgresRoleStore, PostgresSessionStore,
};

use crate::config::ApiConfig;

pub type DynSessionStore = Arc<dyn SessionStore>;
pub type DynRoleStore = Arc<dyn RoleStore>;
pub type Engine = AuthorizationEngine<DynSessionStore, DynRoleStore>;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("DATABASE_URL is required for persistent stores")]
    MissingDatabaseUrl,

    #[error("failed to connect to Postgres: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("failed to prepare schema: {0}")]
    Schema(#[from] StoreError),
}

pub struct AppServices {
    pub engine: Engine,
}

impl AppServices {
    pub fn new(sessions: DynSessionStore, roles: DynRoleStore, config: EngineConfig) -> Self {
        Self {
            engine: AuthorizationEngine::new(sessions, roles, config),
        }
    }
}

pub fn engine_config(config: &ApiConfig) -> EngineConfig {
    EngineConfig {
        fetch_timeout: config.role_fetch_timeout,
    }
}

/// Build services for the configured backend.
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, ServicesError> {
    if !config.use_persistent_stores {
        tracing::warn!("using in-memory stores; sessions and roles start empty");
        return Ok(AppServices::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryRoleStore::new()),
            engine_config(config),
        ));
    }

    let database_url = config
        .database_url
        .as_deref()
        .ok_or(ServicesError::MissingDatabaseUrl)?;

    let pool = Arc::new(
        PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?,
    );
    agora_infra::ensure_schema(&pool).await?;
    tracing::info!("connected to Postgres");

    Ok(AppServices::new(
        Arc::new(PostgresSessionStore::from_shared(Arc::clone(&pool))),
        Arc::new(PostgresRoleStore::from_shared(pool)),
        engine_config(config),
    ))
}
