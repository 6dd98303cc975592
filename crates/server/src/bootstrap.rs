use std::sync::Arc;

use hipfrog_core::config::AppConfig;
use hipfrog_db::connection::connect_from_config;
use hipfrog_db::{migrations, DbPool, SqlInstallationRepository};
use hipfrog_glassfrog::HttpGlassfrogClient;
use hipfrog_hipchat::HttpHipchatClient;
use thiserror::Error;
use tracing::info;

use crate::state::{AppState, SharedGlassfrog, SharedHipchat, SharedInstallations};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("configuration page template is invalid: {0}")]
    Templates(#[source] tera::Error),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
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

    let installations: SharedInstallations =
        Arc::new(SqlInstallationRepository::new(db_pool.clone()));
    let glassfrog: SharedGlassfrog =
        Arc::new(HttpGlassfrogClient::new(config.glassfrog.api_url.clone()));
    let hipchat: SharedHipchat = Arc::new(HttpHipchatClient::new());
    let state = AppState::new(config.clone(), installations, glassfrog, hipchat)
        .map_err(BootstrapError::Templates)?;

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use hipfrog_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use hipfrog_db::InstallationRepository;

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    fn config(database_url: &str) -> AppConfig {
        AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                public_url: Some("https://hipfrog.example".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("valid config")
    }

    #[tokio::test]
    async fn bootstrap_reports_unreachable_database() {
        let result = bootstrap_with_config(config("sqlite:///nonexistent-dir/hipfrog/app.db")).await;

        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_store() {
        let app = bootstrap_with_config(config("sqlite::memory:"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'installation'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("installation table lookup");
        assert_eq!(table_count, 1);

        let installations = app.state.installations.list().await.expect("empty store");
        assert!(installations.is_empty());
        assert_eq!(app.state.config.server.public_url, "https://hipfrog.example");

        app.db_pool.close().await;
    }
}
