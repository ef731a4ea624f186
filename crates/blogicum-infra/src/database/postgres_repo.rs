//! PostgreSQL repository implementations.
//!
//! [`PostQuery`] filters become SQL predicates over `posts` (joined with
//! `categories` when a filter needs it). Annotations and relations are
//! loaded with one batched query per relation for the whole page.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DbConn, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select,
};
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Location, Post, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::PageRequest;
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use blogicum_core::query::{CommentCard, PostCard, PostFilter, PostOrdering, PostQuery, RelatedData};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Title)
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn list_all(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .order_by_asc(location::Column::Name)
            .order_by_asc(location::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Filters of `query` as a `SELECT` over posts.
pub(crate) fn build_select(query: &PostQuery) -> Select<PostEntity> {
    let mut select = PostEntity::find();

    if query.needs_category() {
        select = select.inner_join(CategoryEntity);
    }

    for filter in query.filters() {
        select = match filter {
            PostFilter::Published { now } => select
                .filter(post::Column::IsPublished.eq(true))
                .filter(category::Column::IsPublished.eq(true))
                .filter(post::Column::PubDate.lt(*now)),
            PostFilter::Id(id) => select.filter(post::Column::Id.eq(*id)),
            PostFilter::CategorySlug(slug) => {
                select.filter(category::Column::Slug.eq(slug.as_str()))
            }
            PostFilter::Author(author_id) => select.filter(post::Column::AuthorId.eq(*author_id)),
        };
    }

    select
}

fn apply_ordering(select: Select<PostEntity>, ordering: PostOrdering) -> Select<PostEntity> {
    let order = match ordering {
        PostOrdering::PubDateDesc => Order::Desc,
        PostOrdering::PubDateAsc => Order::Asc,
    };

    select
        .order_by(post::Column::PubDate, order.clone())
        .order_by(post::Column::CreatedAt, order.clone())
        .order_by(post::Column::Id, order)
}

fn distinct(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

async fn load_users(db: &DbConn, ids: Vec<Uuid>) -> Result<HashMap<Uuid, User>, RepoError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let models = UserEntity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(map_db_err)?;

    Ok(models.into_iter().map(|m| (m.id, m.into())).collect())
}

async fn load_categories(
    db: &DbConn,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Category>, RepoError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let models = CategoryEntity::find()
        .filter(category::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(map_db_err)?;

    Ok(models.into_iter().map(|m| (m.id, m.into())).collect())
}

async fn load_locations(
    db: &DbConn,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, Location>, RepoError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let models = LocationEntity::find()
        .filter(location::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(map_db_err)?;

    Ok(models.into_iter().map(|m| (m.id, m.into())).collect())
}

/// Live comment counts for the given posts. Posts without comments are absent.
async fn load_comment_counts(
    db: &DbConn,
    post_ids: &[Uuid],
) -> Result<HashMap<Uuid, u64>, RepoError> {
    let rows: Vec<(Uuid, i64)> = CommentEntity::find()
        .select_only()
        .column(comment::Column::PostId)
        .column_as(
            Expr::col((CommentEntity, comment::Column::Id)).count(),
            "comment_count",
        )
        .filter(comment::Column::PostId.is_in(post_ids.to_vec()))
        .group_by(comment::Column::PostId)
        .into_tuple()
        .all(db)
        .await
        .map_err(map_db_err)?;

    Ok(rows
        .into_iter()
        .map(|(post_id, count)| (post_id, count.max(0) as u64))
        .collect())
}

/// Chronological comment threads, keyed by post.
async fn load_threads(
    db: &DbConn,
    post_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<CommentCard>>, RepoError> {
    let comments: Vec<Comment> = CommentEntity::find()
        .filter(comment::Column::PostId.is_in(post_ids.to_vec()))
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .all(db)
        .await
        .map_err(map_db_err)?
        .into_iter()
        .map(Into::into)
        .collect();

    let authors = load_users(db, distinct(comments.iter().map(|c| c.author_id))).await?;

    let mut threads: HashMap<Uuid, Vec<CommentCard>> = HashMap::new();
    for comment in comments {
        threads.entry(comment.post_id).or_default().push(CommentCard {
            author: authors.get(&comment.author_id).cloned(),
            comment,
        });
    }

    Ok(threads)
}

impl PostgresPostRepository {
    async fn attach(&self, query: &PostQuery, posts: Vec<Post>) -> Result<Vec<PostCard>, RepoError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let counts = if query.annotates_comment_count() {
            Some(load_comment_counts(&self.db, &post_ids).await?)
        } else {
            None
        };

        let (authors, categories, locations) = if query.related() != RelatedData::None {
            (
                load_users(&self.db, distinct(posts.iter().map(|p| p.author_id))).await?,
                load_categories(&self.db, distinct(posts.iter().filter_map(|p| p.category_id)))
                    .await?,
                load_locations(&self.db, distinct(posts.iter().filter_map(|p| p.location_id)))
                    .await?,
            )
        } else {
            Default::default()
        };

        let mut threads = if query.related() == RelatedData::WithComments {
            Some(load_threads(&self.db, &post_ids).await?)
        } else {
            None
        };

        Ok(posts
            .into_iter()
            .map(|post| PostCard {
                comment_count: counts
                    .as_ref()
                    .map(|c| c.get(&post.id).copied().unwrap_or(0)),
                author: authors.get(&post.author_id).cloned(),
                category: post.category_id.and_then(|id| categories.get(&id).cloned()),
                location: post.location_id.and_then(|id| locations.get(&id).cloned()),
                comments: threads
                    .as_mut()
                    .map(|t| t.remove(&post.id).unwrap_or_default()),
                post,
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn count(&self, query: &PostQuery) -> Result<u64, RepoError> {
        build_select(query)
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn fetch(
        &self,
        query: &PostQuery,
        page: Option<PageRequest>,
    ) -> Result<Vec<PostCard>, RepoError> {
        tracing::debug!(filters = ?query.filters(), ?page, "Fetching posts");

        let mut select = apply_ordering(build_select(query), query.ordering());
        if let Some(page) = page {
            select = select.offset(page.offset).limit(page.limit);
        }

        let posts: Vec<Post> = select
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Into::into)
            .collect();

        self.attach(query, posts).await
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentCard>, RepoError> {
        let mut threads = load_threads(&self.db, &[post_id]).await?;
        Ok(threads.remove(&post_id).unwrap_or_default())
    }
}
