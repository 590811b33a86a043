use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use triage_agent::{LlmError, OllamaClient};
use triage_core::config::{AppConfig, ConfigError, LoadOptions};
use triage_db::repositories::{
    SqlConversationRepository, SqlInvoiceRepository, SqlOrderRepository,
};
use triage_db::{DbPool, connect, migrations};

use crate::chat::ChatState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub chat_state: Arc<ChatState>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("model client setup failed: {0}")]
    Llm(#[source] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let llm = Arc::new(OllamaClient::from_config(&config.llm).map_err(BootstrapError::Llm)?);
    let chat_state = Arc::new(ChatState::new(
        llm,
        Arc::new(SqlOrderRepository::new(db_pool.clone())),
        Arc::new(SqlInvoiceRepository::new(db_pool.clone())),
        Arc::new(SqlConversationRepository::new(db_pool.clone())),
        &config.chat,
    ));
    info!(
        event_name = "system.bootstrap.agent_ready",
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        "agent runtime assembled"
    );

    Ok(Application { config, db_pool, chat_state })
}
