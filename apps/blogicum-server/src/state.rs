//! Application state - shared across all handlers.

use std::sync::Arc;

use blogicum_core::Paginator;
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use blogicum_infra::InMemoryDatabase;
use blogicum_infra::database::DatabaseConnections;

#[cfg(feature = "postgres")]
use blogicum_infra::database::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub paginator: Paginator,
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let paginator = Paginator::new(config.posts_per_page);

        #[cfg(feature = "postgres")]
        {
            if let Some(db_config) = &config.database {
                match DatabaseConnections::init(db_config).await {
                    Ok(connections) => {
                        tracing::info!("Application state initialized (postgres)");
                        return Self::postgres(Arc::new(connections), paginator);
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running with the in-memory store.");
            }
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory store");

        tracing::info!("Application state initialized (in-memory)");
        Self::in_memory(&InMemoryDatabase::new(), paginator)
    }

    #[cfg(feature = "postgres")]
    fn postgres(connections: Arc<DatabaseConnections>, paginator: Paginator) -> Self {
        let conn = connections.main.clone();

        Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(conn.clone())),
            locations: Arc::new(PostgresLocationRepository::new(conn.clone())),
            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
            comments: Arc::new(PostgresCommentRepository::new(conn)),
            paginator,
            db: Some(connections),
        }
    }

    /// State backed by one set of in-memory tables.
    pub fn in_memory(database: &InMemoryDatabase, paginator: Paginator) -> Self {
        Self {
            users: Arc::new(database.users()),
            categories: Arc::new(database.categories()),
            locations: Arc::new(database.locations()),
            posts: Arc::new(database.posts()),
            comments: Arc::new(database.comments()),
            paginator,
            db: None,
        }
    }
}
