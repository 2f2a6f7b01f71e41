use std::sync::Arc;

use meme_arena_engine::ArenaService;
use meme_arena_engine::policy::admin_policy_for;
use meme_arena_repository::{ArenaRepository, InMemoryArenaRepository, PostgresArenaRepository};
use tracing::{info, warn};

use crate::config::ArenaConfig;
use crate::errors::StartupError;

/// `Dependencies` holds the components the HTTP server runs on.
pub struct Dependencies {
    pub service: Arc<ArenaService>,
}

impl Dependencies {
    /// Creates a new `Dependencies` instance.
    ///
    /// Connects to PostgreSQL and applies migrations when a database URL is
    /// configured; otherwise the in-memory store is used and nothing persists
    /// across restarts.
    ///
    /// # Errors
    ///
    /// Returns a `StartupError::Repository` if the database cannot be reached
    /// or migrated.
    pub async fn new(config: &ArenaConfig) -> Result<Self, StartupError> {
        let repository: Arc<dyn ArenaRepository> = match &config.database_url {
            Some(url) => {
                let repository = PostgresArenaRepository::connect(url).await?;
                info!("Connected to PostgreSQL, migrations applied");
                Arc::new(repository)
            }
            None => {
                warn!("DATABASE_URL not set, using the in-memory store");
                match config.memory_item_capacity {
                    Some(capacity) => Arc::new(InMemoryArenaRepository::with_capacity(capacity)),
                    None => Arc::new(InMemoryArenaRepository::new()),
                }
            }
        };

        Ok(Self::with_repository(repository, config))
    }

    /// Wires the service over an existing repository.
    pub fn with_repository(repository: Arc<dyn ArenaRepository>, config: &ArenaConfig) -> Self {
        let service = ArenaService::new(repository, config.engine.clone())
            .with_delete_policy(config.delete_policy.build())
            .with_admin_policy(admin_policy_for(&config.admin_user_ids));
        info!(
            delete_policy = %config.delete_policy,
            admins = config.admin_user_ids.len(),
            daily_selection_policy = %config.engine.daily_selection_policy,
            max_upload_bytes = config.engine.max_upload_bytes,
            "Arena service configured"
        );
        Self {
            service: Arc::new(service),
        }
    }
}
