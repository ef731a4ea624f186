//! Table storage and per-entity schema rules.

use std::collections::HashMap;

use blogicum_core::domain::{Category, Comment, Location, Post, User};
use blogicum_core::error::RepoError;
use uuid::Uuid;

#[derive(Default)]
pub struct Tables {
    pub users: HashMap<Uuid, User>,
    pub categories: HashMap<Uuid, Category>,
    pub locations: HashMap<Uuid, Location>,
    pub posts: HashMap<Uuid, Post>,
    pub comments: HashMap<Uuid, Comment>,
}

impl Tables {
    pub fn category_of(&self, post: &Post) -> Option<&Category> {
        post.category_id.and_then(|id| self.categories.get(&id))
    }
}

/// A row type with its table, constraints and delete rules.
pub trait Stored: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    fn table(tables: &Tables) -> &HashMap<Uuid, Self>;

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self>;

    /// Unique and foreign key checks, run before every write.
    fn check_constraints(&self, _tables: &Tables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Cascade or null out dependent rows after `id` was removed.
    fn on_delete(_tables: &mut Tables, _id: Uuid) {}
}

fn unique_violation(what: &str) -> RepoError {
    RepoError::Constraint(format!("{what} already exists"))
}

fn missing_reference(what: &str) -> RepoError {
    RepoError::Constraint(format!("referenced {what} does not exist"))
}

impl Stored for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.users
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.users
    }

    fn check_constraints(&self, tables: &Tables) -> Result<(), RepoError> {
        let taken = tables
            .users
            .values()
            .any(|u| u.id != self.id && u.username == self.username);
        if taken {
            return Err(unique_violation("username"));
        }
        Ok(())
    }

    fn on_delete(tables: &mut Tables, id: Uuid) {
        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.posts.remove(&post_id);
            Post::on_delete(tables, post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
    }
}

impl Stored for Category {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.categories
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.categories
    }

    fn check_constraints(&self, tables: &Tables) -> Result<(), RepoError> {
        let taken = tables
            .categories
            .values()
            .any(|c| c.id != self.id && c.slug == self.slug);
        if taken {
            return Err(unique_violation("slug"));
        }
        Ok(())
    }

    fn on_delete(tables: &mut Tables, id: Uuid) {
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
    }
}

impl Stored for Location {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.locations
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.locations
    }

    fn on_delete(tables: &mut Tables, id: Uuid) {
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
    }
}

impl Stored for Post {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.posts
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.posts
    }

    fn check_constraints(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.users.contains_key(&self.author_id) {
            return Err(missing_reference("author"));
        }
        if self
            .category_id
            .is_some_and(|id| !tables.categories.contains_key(&id))
        {
            return Err(missing_reference("category"));
        }
        if self
            .location_id
            .is_some_and(|id| !tables.locations.contains_key(&id))
        {
            return Err(missing_reference("location"));
        }
        Ok(())
    }

    fn on_delete(tables: &mut Tables, id: Uuid) {
        tables.comments.retain(|_, c| c.post_id != id);
    }
}

impl Stored for Comment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.comments
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.comments
    }

    fn check_constraints(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.posts.contains_key(&self.post_id) {
            return Err(missing_reference("post"));
        }
        if !tables.users.contains_key(&self.author_id) {
            return Err(missing_reference("author"));
        }
        Ok(())
    }
}
