use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - an account that can author posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with generated ID and timestamp.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Usernames: 1 to 150 characters of letters, digits and `@.+-_`.
    pub fn is_valid_username(username: &str) -> bool {
        let len = username.chars().count();
        (1..=150).contains(&len)
            && username
                .chars()
                .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    }
}
