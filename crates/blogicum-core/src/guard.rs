//! Ownership checks for post and comment mutations.
//!
//! A failed check on a mutation is not an error: the caller is sent back to
//! the post's detail page and nothing changes. This silent redirect is
//! atypical and kept on purpose; product owners know about it.

use uuid::Uuid;

use crate::domain::{Comment, Post};

/// Whoever issues the request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    User { id: Uuid, username: String },
}

impl Actor {
    pub fn user(id: Uuid, username: impl Into<String>) -> Self {
        Self::User {
            id,
            username: username.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Actor::User { .. })
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::Anonymous => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Actor::User { username, .. } => Some(username),
            Actor::Anonymous => None,
        }
    }

    /// Anonymous actors are never anyone's author.
    pub fn is(&self, user_id: Uuid) -> bool {
        self.id() == Some(user_id)
    }
}

/// Entities with a single owning author.
pub trait Owned {
    fn author_id(&self) -> Uuid;
}

impl Owned for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// Outcome of a mutation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    /// Skip the mutation and redirect to this post's detail page.
    Forbidden { redirect_to: Uuid },
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allowed)
    }
}

pub fn can_edit(actor: &Actor, entity: &impl Owned) -> bool {
    actor.is(entity.author_id())
}

/// Gate a mutation of `entity`, which belongs to (or is) post `post_id`.
pub fn authorize_mutation(actor: &Actor, entity: &impl Owned, post_id: Uuid) -> Authorization {
    if can_edit(actor, entity) {
        Authorization::Allowed
    } else {
        Authorization::Forbidden {
            redirect_to: post_id,
        }
    }
}

/// Authors see their own unpublished, hidden-category and scheduled posts.
pub fn can_view_hidden(actor: &Actor, post: &Post) -> bool {
    actor.is(post.author_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post_by(author: Uuid) -> Post {
        Post::new(author, "Title".into(), "Text".into(), Utc::now(), None)
    }

    #[test]
    fn test_author_can_edit() {
        let author = Uuid::new_v4();
        let post = post_by(author);

        assert!(can_edit(&Actor::user(author, "author"), &post));
        assert_eq!(
            authorize_mutation(&Actor::user(author, "author"), &post, post.id),
            Authorization::Allowed
        );
    }

    #[test]
    fn test_other_user_is_redirected() {
        let post = post_by(Uuid::new_v4());
        let stranger = Actor::user(Uuid::new_v4(), "stranger");

        assert!(!can_edit(&stranger, &post));
        assert_eq!(
            authorize_mutation(&stranger, &post, post.id),
            Authorization::Forbidden {
                redirect_to: post.id
            }
        );
    }

    #[test]
    fn test_anonymous_fails_closed() {
        let post = post_by(Uuid::new_v4());
        let comment = Comment::new(post.id, post.author_id, "Hi".into());

        assert!(!Actor::Anonymous.is_authenticated());
        assert!(!can_edit(&Actor::Anonymous, &post));
        assert!(!can_edit(&Actor::Anonymous, &comment));
        assert!(!can_view_hidden(&Actor::Anonymous, &post));
    }

    #[test]
    fn test_comment_redirects_to_its_post() {
        let post = post_by(Uuid::new_v4());
        let comment = Comment::new(post.id, Uuid::new_v4(), "Hi".into());
        let other = Actor::user(post.author_id, "post-author");

        // Owning the post does not grant rights over other people's comments.
        assert_eq!(
            authorize_mutation(&other, &comment, post.id),
            Authorization::Forbidden {
                redirect_to: post.id
            }
        );
    }
}
