use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a publishable article.
///
/// A post is publicly visible only while it is published, its category is
/// published and its `pub_date` has passed. A `pub_date` in the future
/// schedules the publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new published post.
    pub fn new(
        author_id: Uuid,
        title: String,
        text: String,
        pub_date: DateTime<Utc>,
        category_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            text,
            pub_date,
            author_id,
            location_id: None,
            category_id,
            image: None,
            is_published: true,
            created_at: Utc::now(),
        }
    }

    pub fn with_location(mut self, location_id: Option<Uuid>) -> Self {
        self.location_id = location_id;
        self
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    /// True if the post's own flag and date allow publication at `now`.
    /// The category flag is checked separately since it lives on another row.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_published && self.pub_date < now
    }
}
