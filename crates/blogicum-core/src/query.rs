//! Post query composer.
//!
//! Every post listing and detail lookup is described by a [`PostQuery`]: an
//! explicit pipeline of filter, annotation, relation and ordering stages.
//! Repositories evaluate the same pipeline, in SQL or in memory, so the
//! visibility rules live in one place.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Category, Comment, Location, Post, User};
use crate::error::RepoError;
use crate::guard::{self, Actor};
use crate::pagination::{Page, Paginator};
use crate::ports::PostRepository;

/// A row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    /// `is_published ∧ category.is_published ∧ pub_date < now`.
    Published { now: DateTime<Utc> },
    Id(Uuid),
    CategorySlug(String),
    Author(Uuid),
}

impl PostFilter {
    /// Evaluate against a post and its category (if it has one).
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        match self {
            PostFilter::Published { now } => {
                post.is_live(*now) && category.is_some_and(|c| c.is_published)
            }
            PostFilter::Id(id) => post.id == *id,
            PostFilter::CategorySlug(slug) => category.is_some_and(|c| &c.slug == slug),
            PostFilter::Author(author_id) => post.author_id == *author_id,
        }
    }

    /// True if evaluating the filter needs the post's category row.
    pub fn needs_category(&self) -> bool {
        matches!(
            self,
            PostFilter::Published { .. } | PostFilter::CategorySlug(_)
        )
    }
}

/// Which relations are attached to each result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelatedData {
    #[default]
    None,
    /// Author, category and location.
    NoComments,
    /// Author, category, location and the comment thread.
    WithComments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrdering {
    /// Newest first.
    #[default]
    PubDateDesc,
    PubDateAsc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    filters: Vec<PostFilter>,
    ordering: PostOrdering,
    comment_count: bool,
    related: RelatedData,
}

impl PostQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Public listing: published posts, newest first.
    pub fn index(now: DateTime<Utc>) -> Self {
        Self::new()
            .published(now)
            .with_annotated_comment_count()
            .with_related_data_no_comments()
    }

    /// Published posts of one category.
    pub fn category(slug: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::index(now).in_category(slug)
    }

    /// Posts of one author. The owner sees everything they wrote, other
    /// viewers only what is publicly visible.
    pub fn profile(author_id: Uuid, viewer: &Actor, now: DateTime<Utc>) -> Self {
        let query = Self::new()
            .by_author(author_id)
            .with_annotated_comment_count()
            .with_related_data_no_comments();

        if viewer.is(author_id) {
            query
        } else {
            query.published(now)
        }
    }

    /// A single post with its comment thread. Non-authors only get a match
    /// while the post is publicly visible.
    pub fn detail(post: &Post, viewer: &Actor, now: DateTime<Utc>) -> Self {
        let query = Self::new()
            .with_id(post.id)
            .with_annotated_comment_count()
            .with_related_data();

        if guard::can_view_hidden(viewer, post) {
            query
        } else {
            query.published(now)
        }
    }

    pub fn published(mut self, now: DateTime<Utc>) -> Self {
        self.filters.push(PostFilter::Published { now });
        self
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.filters.push(PostFilter::Id(id));
        self
    }

    pub fn in_category(mut self, slug: impl Into<String>) -> Self {
        self.filters.push(PostFilter::CategorySlug(slug.into()));
        self
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.filters.push(PostFilter::Author(author_id));
        self
    }

    /// Attach the live number of comments to every result.
    pub fn with_annotated_comment_count(mut self) -> Self {
        self.comment_count = true;
        self
    }

    /// Eagerly attach author, category, location and comments.
    pub fn with_related_data(mut self) -> Self {
        self.related = RelatedData::WithComments;
        self
    }

    /// Eagerly attach author, category and location.
    pub fn with_related_data_no_comments(mut self) -> Self {
        self.related = RelatedData::NoComments;
        self
    }

    pub fn order_by(mut self, ordering: PostOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn filters(&self) -> &[PostFilter] {
        &self.filters
    }

    pub fn ordering(&self) -> PostOrdering {
        self.ordering
    }

    pub fn annotates_comment_count(&self) -> bool {
        self.comment_count
    }

    pub fn related(&self) -> RelatedData {
        self.related
    }

    pub fn needs_category(&self) -> bool {
        self.filters.iter().any(PostFilter::needs_category)
    }

    /// Evaluate every filter against a post and its category.
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        self.filters.iter().all(|f| f.matches(post, category))
    }

    /// Order by `pub_date`, then `created_at`, then id, all in the query's
    /// direction.
    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        let ascending = a
            .pub_date
            .cmp(&b.pub_date)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id));

        match self.ordering {
            PostOrdering::PubDateAsc => ascending,
            PostOrdering::PubDateDesc => ascending.reverse(),
        }
    }

    pub fn sort(&self, posts: &mut [Post]) {
        posts.sort_by(|a, b| self.compare(a, b));
    }
}

/// A comment with its author resolved.
#[derive(Debug, Clone, Serialize)]
pub struct CommentCard {
    pub comment: Comment,
    pub author: Option<User>,
}

/// A query result: the post plus whatever the query asked to attach.
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub post: Post,
    pub comment_count: Option<u64>,
    pub author: Option<User>,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comments: Option<Vec<CommentCard>>,
}

impl PostCard {
    pub fn bare(post: Post) -> Self {
        Self {
            post,
            comment_count: None,
            author: None,
            category: None,
            location: None,
            comments: None,
        }
    }
}

/// Count, clamp the requested page, then fetch that page.
pub async fn paginate(
    repo: &dyn PostRepository,
    query: &PostQuery,
    paginator: &Paginator,
    requested: Option<&str>,
) -> Result<Page<PostCard>, RepoError> {
    let count = repo.count(query).await?;
    let request = paginator.resolve(count, requested);
    let items = repo.fetch(query, Some(request)).await?;

    Ok(Page::new(items, request, count, paginator.num_pages(count)))
}
