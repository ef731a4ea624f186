//! Data Transfer Objects - view-models handed to templates and JSON bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::forms::{CommentForm, FormErrors, LoginForm, PostForm, ProfileForm, RegistrationForm};

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorView {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl AuthorView {
    /// "First Last", or the username when both are blank.
    pub fn full_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Profile page header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub author: AuthorView,
    pub full_name: String,
    pub date_joined: DateTime<Utc>,
    /// True when the viewer owns this profile.
    pub is_owner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationView {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: Option<AuthorView>,
    pub category: Option<CategoryView>,
    pub location: Option<LocationView>,
    pub image: Option<String>,
    pub is_published: bool,
    pub comment_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<AuthorView>,
}

/// A page of a listing, in the shape listing templates iterate over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u64>,
    pub previous_page_number: Option<u64>,
    pub start_index: u64,
    pub end_index: u64,
}

/// One `<option>` of a select field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Submitted (or initial) form values plus their field errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormView<F> {
    pub data: F,
    pub errors: FormErrors,
}

impl<F> FormView<F> {
    pub fn new(data: F) -> Self {
        Self {
            data,
            errors: FormErrors::new(),
        }
    }

    pub fn with_errors(data: F, errors: FormErrors) -> Self {
        Self { data, errors }
    }
}

// ---------------------------------------------------------------------------
// Template contexts
// ---------------------------------------------------------------------------

/// `blog/index.html`
#[derive(Debug, Clone, Serialize)]
pub struct IndexContext {
    pub page_obj: PageView<PostView>,
}

/// `blog/category.html`
#[derive(Debug, Clone, Serialize)]
pub struct CategoryContext {
    pub category: CategoryView,
    pub page_obj: PageView<PostView>,
}

/// `blog/profile.html`
#[derive(Debug, Clone, Serialize)]
pub struct ProfileContext {
    pub profile: ProfileView,
    pub page_obj: PageView<PostView>,
}

/// `blog/detail.html`
#[derive(Debug, Clone, Serialize)]
pub struct DetailContext {
    pub post: PostView,
    /// Empty comment form; absent for anonymous viewers.
    pub form: Option<FormView<CommentForm>>,
    pub comments: Vec<CommentView>,
}

/// `blog/create.html` in create and edit mode.
#[derive(Debug, Clone, Serialize)]
pub struct PostFormContext {
    pub form: FormView<PostForm>,
    pub categories: Vec<ChoiceView>,
    pub locations: Vec<ChoiceView>,
    /// The post being edited.
    pub instance: Option<PostView>,
}

/// `blog/create.html` as a delete confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct DeletePostContext {
    pub instance: PostView,
}

/// `blog/comment.html` in create and edit mode.
#[derive(Debug, Clone, Serialize)]
pub struct CommentFormContext {
    pub post_id: Uuid,
    pub form: FormView<CommentForm>,
    pub comment: Option<CommentView>,
}

/// `blog/comment.html` as a delete confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteCommentContext {
    pub post_id: Uuid,
    pub comment: CommentView,
}

/// `blog/user.html`
#[derive(Debug, Clone, Serialize)]
pub struct ProfileFormContext {
    pub form: FormView<ProfileForm>,
}

/// `registration/registration_form.html`
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationContext {
    pub form: FormView<RegistrationForm>,
}

/// `registration/login.html`
#[derive(Debug, Clone, Serialize)]
pub struct LoginPageContext {
    /// Carries the page to return to after logging in in `data.next`.
    pub form: FormView<LoginForm>,
}

/// Context of pages that render no data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmptyContext {}

// ---------------------------------------------------------------------------
// JSON bodies
// ---------------------------------------------------------------------------

/// Request to obtain a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(first: &str, last: &str) -> AuthorView {
        AuthorView {
            id: Uuid::new_v4(),
            username: "leo".into(),
            first_name: first.into(),
            last_name: last.into(),
        }
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        assert_eq!(author("Leo", "Tolstoy").full_name(), "Leo Tolstoy");
        assert_eq!(author("Leo", "").full_name(), "Leo");
        assert_eq!(author("", "").full_name(), "leo");
    }

    #[test]
    fn test_profile_view_flattens_author() {
        let profile = ProfileView {
            author: author("", ""),
            full_name: "leo".into(),
            date_joined: Utc::now(),
            is_owner: false,
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["username"], "leo");
        assert_eq!(json["is_owner"], false);
    }
}
