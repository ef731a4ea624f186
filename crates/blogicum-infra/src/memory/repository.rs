use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Location, Post, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::PageRequest;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blogicum_core::query::{CommentCard, PostCard, PostQuery, RelatedData};

use super::tables::{Stored, Tables};

/// Generic in-memory repository over one table of the shared store.
pub struct InMemoryRepository<T> {
    tables: Arc<RwLock<Tables>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> InMemoryRepository<T> {
    pub(crate) fn new(tables: Arc<RwLock<Tables>>) -> Self {
        Self {
            tables,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Stored> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let tables = self.tables.read().await;
        Ok(T::table(&tables).get(&id).cloned())
    }

    async fn insert(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.tables.write().await;

        if T::table(&tables).contains_key(&entity.id()) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        entity.check_constraints(&tables)?;

        T::table_mut(&mut tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.tables.write().await;

        if !T::table(&tables).contains_key(&entity.id()) {
            return Err(RepoError::NotFound);
        }
        entity.check_constraints(&tables)?;

        T::table_mut(&mut tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        if T::table_mut(&mut tables).remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        T::on_delete(&mut tables, id);

        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryRepository<Category> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(categories)
    }
}

#[async_trait]
impl LocationRepository for InMemoryRepository<Location> {
    async fn list_all(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(locations)
    }
}

fn matching_posts(tables: &Tables, query: &PostQuery) -> Vec<Post> {
    tables
        .posts
        .values()
        .filter(|p| query.matches(p, tables.category_of(p)))
        .cloned()
        .collect()
}

fn comment_thread(tables: &Tables, post_id: Uuid) -> Vec<CommentCard> {
    let mut comments: Vec<&Comment> = tables
        .comments
        .values()
        .filter(|c| c.post_id == post_id)
        .collect();
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    comments
        .into_iter()
        .map(|c| CommentCard {
            comment: c.clone(),
            author: tables.users.get(&c.author_id).cloned(),
        })
        .collect()
}

fn build_card(tables: &Tables, query: &PostQuery, post: Post) -> PostCard {
    let related = query.related() != RelatedData::None;

    PostCard {
        comment_count: query.annotates_comment_count().then(|| {
            tables
                .comments
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as u64
        }),
        author: related
            .then(|| tables.users.get(&post.author_id).cloned())
            .flatten(),
        category: related
            .then(|| tables.category_of(&post).cloned())
            .flatten(),
        location: related
            .then(|| post.location_id.and_then(|id| tables.locations.get(&id).cloned()))
            .flatten(),
        comments: (query.related() == RelatedData::WithComments)
            .then(|| comment_thread(tables, post.id)),
        post,
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository<Post> {
    async fn count(&self, query: &PostQuery) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(matching_posts(&tables, query).len() as u64)
    }

    async fn fetch(
        &self,
        query: &PostQuery,
        page: Option<PageRequest>,
    ) -> Result<Vec<PostCard>, RepoError> {
        let tables = self.tables.read().await;

        let mut posts = matching_posts(&tables, query);
        query.sort(&mut posts);

        let (offset, limit) = page
            .map(|p| (p.offset as usize, p.limit as usize))
            .unwrap_or((0, usize::MAX));

        tracing::debug!(
            matched = posts.len(),
            offset,
            "Evaluated post query in memory"
        );

        Ok(posts
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|post| build_card(&tables, query, post))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryRepository<Comment> {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentCard>, RepoError> {
        let tables = self.tables.read().await;
        Ok(comment_thread(&tables, post_id))
    }
}
