//! Application context - dependency injection container

use std::sync::Arc;

use goldfish_core::{CredentialStore, SyncOrchestrator, TaskService};
use goldfish_domain::{AccessToken, Config, Result};
use goldfish_infra::canvas::CanvasClient;
use goldfish_infra::portal::PortalClient;
use goldfish_infra::{
    create_all_adapters, DbManager, HttpClient, SqliteCredentialRepository, SqliteNoteRepository,
    SqliteTaskRepository,
};
use tracing::{info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,

    // Use cases
    pub credentials: Arc<CredentialStore>,
    pub sync: Arc<SyncOrchestrator>,
    pub tasks: Arc<TaskService>,

    // Pass-through proxy clients
    pub canvas: CanvasClient,
    pub portal: PortalClient,
}

impl AppContext {
    /// Build the context: open the database, apply migrations and wire the
    /// repositories, adapters and services together.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;
        Self::with_database(config, db)
    }

    /// Build the context over an already migrated database.
    pub fn with_database(config: Config, db: Arc<DbManager>) -> Result<Self> {
        let http = HttpClient::new()?;

        let task_repository = Arc::new(SqliteTaskRepository::new(Arc::clone(&db)));
        let credential_repository = Arc::new(SqliteCredentialRepository::new(Arc::clone(&db)));
        let note_repository = Arc::new(SqliteNoteRepository::new(Arc::clone(&db)));

        let credentials = Arc::new(CredentialStore::new(credential_repository));
        let adapters = create_all_adapters(&config, &http)?;
        let sync = Arc::new(SyncOrchestrator::new(
            adapters,
            Arc::clone(&credentials),
            task_repository.clone(),
        ));
        let tasks = Arc::new(TaskService::new(task_repository, note_repository));

        let canvas = CanvasClient::new(http.clone(), &config.canvas.base_url);
        let portal = PortalClient::new(http, &config.portal.base_url, config.portal.service.clone());

        if config.canvas.api_token.is_none() {
            warn!("no server-side Canvas token configured; requests must carry their own");
        }
        info!(db = %db.path().display(), "application context ready");

        Ok(Self { config, db, credentials, sync, tasks, canvas, portal })
    }

    /// Token for a Canvas proxy call: the caller's own, else the server's.
    pub fn canvas_token(&self, supplied: Option<AccessToken>) -> Option<AccessToken> {
        supplied.or_else(|| self.config.canvas.api_token.clone().and_then(AccessToken::new))
    }

    /// Component health, with a live database probe.
    pub async fn health_check(&self) -> HealthStatus {
        let mut status = HealthStatus::new()
            .add_component(self.check_database_health().await)
            .add_component(ComponentHealth::healthy("sync_orchestrator"));
        status.calculate_score();
        status
    }

    async fn check_database_health(&self) -> ComponentHealth {
        let db = Arc::clone(&self.db);
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(())) => ComponentHealth::healthy("database"),
            Ok(Err(err)) => ComponentHealth::unhealthy("database", err.to_string()),
            Err(err) => ComponentHealth::unhealthy("database", format!("health check panicked: {err}")),
        }
    }
}
