use std::sync::Arc;

use techshop_actions::{ActionRegistry, ActionServices, BackendClient, BackendError};
use techshop_core::config::{AppConfig, ConfigError, LoadOptions};
use techshop_core::render::{RenderError, RenderSettings, ReplyRenderer};
use techshop_core::search::{FilterResolver, PlanOptions};
use techshop_db::{connect_with_settings, migrations, DbPool, SqlCatalogRepository, SqlStoreRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub registry: Arc<ActionRegistry>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("reply templates failed to load: {0}")]
    Templates(#[from] RenderError),
    #[error("backend client could not be built: {0}")]
    Backend(#[from] BackendError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let services = ActionServices {
        catalog: Arc::new(SqlCatalogRepository::new(db_pool.clone())),
        store: Arc::new(SqlStoreRepository::new(db_pool.clone())),
        renderer: Arc::new(ReplyRenderer::new(RenderSettings::from(&config))?),
        resolver: FilterResolver::new(config.search.thresholds.clone()),
        plan_options: PlanOptions {
            limit: config.search.result_limit,
            unparsed: config.search.unparsed_spec,
        },
        backend: Arc::new(BackendClient::new(&config.backend)?),
    };
    let registry = Arc::new(ActionRegistry::with_default_actions(&services));
    info!(
        event_name = "system.bootstrap.actions_registered",
        correlation_id = "bootstrap",
        actions = registry.len(),
        backend = %config.backend.base_url,
        "action registry ready"
    );

    Ok(Application { config, db_pool, registry })
}
