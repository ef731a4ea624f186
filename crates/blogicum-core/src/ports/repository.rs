use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Comment, Location, Post, User};
use crate::error::RepoError;
use crate::pagination::PageRequest;
use crate::query::{CommentCard, PostCard, PostQuery};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Store a new entity.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, applying the schema's cascade rules.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository. Deleting a user removes their posts and comments.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Category repository. Deleting a category nulls `Post::category_id`.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// Every category, ordered by title. Used for form choices.
    async fn list_all(&self) -> Result<Vec<Category>, RepoError>;
}

/// Location repository. Deleting a location nulls `Post::location_id`.
#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {
    async fn list_all(&self) -> Result<Vec<Location>, RepoError>;
}

/// Post repository - evaluates [`PostQuery`] pipelines.
///
/// Deleting a post removes its comments.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Number of posts matching the query's filters.
    async fn count(&self, query: &PostQuery) -> Result<u64, RepoError>;

    /// Posts matching the query, ordered and optionally sliced to one page,
    /// with the annotations and relations the query asks for.
    async fn fetch(
        &self,
        query: &PostQuery,
        page: Option<PageRequest>,
    ) -> Result<Vec<PostCard>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments of a post in chronological order, with their authors.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentCard>, RepoError>;
}
