use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Category - administrator-managed grouping of posts, addressed by slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Create a published category. Fails if the slug is not URL-safe.
    pub fn new(title: String, description: String, slug: String) -> Result<Self, DomainError> {
        if !Self::is_valid_slug(&slug) {
            return Err(DomainError::Validation(format!(
                "'{slug}' is not a valid slug: use latin letters, digits, '-' and '_'"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            title,
            description,
            slug,
            is_published: true,
            created_at: Utc::now(),
        })
    }

    /// Slugs are non-empty and limited to `[A-Za-z0-9_-]`.
    pub fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}
