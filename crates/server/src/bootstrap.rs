use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use rfq_core::audit::TracingAuditSink;
use rfq_core::config::{AppConfig, ConfigError, LoadOptions};
use rfq_db::repositories::{
    SqlContactMessageRepository, SqlProductRepository, SqlQuoteRequestRepository,
};
use rfq_db::{connect_with_config, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::contact::{self, ContactState};
use crate::health;
use crate::quote_wizard::{self, QuoteWizardState};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
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

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        max_connections = config.database.max_connections,
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    Ok(Application { config, db_pool })
}

impl Application {
    /// Full HTTP surface backed by the SQLite repositories.
    pub fn router(&self) -> Router {
        let wizard_state = QuoteWizardState::new(
            Arc::new(SqlProductRepository::new(self.db_pool.clone())),
            Arc::new(SqlQuoteRequestRepository::new(self.db_pool.clone())),
            Arc::new(TracingAuditSink),
            self.config.server.session_capacity,
            Duration::from_secs(self.config.server.session_idle_secs),
        );
        let contact_state =
            ContactState::new(Arc::new(SqlContactMessageRepository::new(self.db_pool.clone())));

        Router::new()
            .merge(health::router(self.db_pool.clone()))
            .merge(quote_wizard::router(wizard_state))
            .merge(contact::router(contact_state))
    }
}
