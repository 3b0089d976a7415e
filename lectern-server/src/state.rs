//! Shared handler state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::repo::{CatalogRepository, PostgresRepository, ProgressRepository};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let repo = Arc::new(PostgresRepository::new(pool));
        Self {
            catalog: Arc::clone(&repo) as Arc<dyn CatalogRepository>,
            progress: repo,
        }
    }

    /// State over explicit repository implementations (used by tests)
    pub fn with_repositories(
        catalog: Arc<dyn CatalogRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self { catalog, progress }
    }
}
