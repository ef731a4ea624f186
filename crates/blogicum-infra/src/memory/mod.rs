//! In-memory relational store.
//!
//! Used when no database is configured and in tests. All repositories of one
//! [`InMemoryDatabase`] share the same tables, so foreign keys, unique
//! columns and cascades behave like the PostgreSQL schema.

mod repository;
mod tables;


use std::sync::Arc;

use blogicum_core::domain::{Category, Comment, Location, Post, User};
use tokio::sync::RwLock;

pub use repository::InMemoryRepository;
use tables::Tables;

pub type InMemoryUserRepository = InMemoryRepository<User>;
pub type InMemoryCategoryRepository = InMemoryRepository<Category>;
pub type InMemoryLocationRepository = InMemoryRepository<Location>;
pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

/// Handle to one set of in-memory tables.
///
/// Note: Data is lost on process restart.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryRepository::new(self.tables.clone())
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryRepository::new(self.tables.clone())
    }

    pub fn locations(&self) -> InMemoryLocationRepository {
        InMemoryRepository::new(self.tables.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryRepository::new(self.tables.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryRepository::new(self.tables.clone())
    }
}
