//! Submitted forms and their field-level validation.
//!
//! Forms are cleaned before anything is written: `clean()` either returns
//! typed values or the complete set of field errors to re-render.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of titles.
pub const MAX_TITLE_LENGTH: usize = 256;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const REQUIRED: &str = "This field is required.";

/// Message for a select value that names no known row.
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field name → messages. Serialized as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// `Ok(value)` when no errors were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

fn required<'a>(errors: &mut FormErrors, field: &str, value: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
    value
}

fn max_length(errors: &mut FormErrors, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!("Ensure this value has at most {max} characters (it has {len})."),
        );
    }
}

fn parse_choice(errors: &mut FormErrors, field: &str, value: &str) -> Option<Uuid> {
    match Uuid::parse_str(value.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

/// Parse a submitted date-time. Accepts RFC 3339 and the naive
/// `datetime-local` forms, which are taken as UTC.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Post create/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    /// Category id.
    pub category: String,
    /// Location id; empty for none.
    pub location: String,
    /// Stored image path; empty for none.
    pub image: String,
}

/// A valid post form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanPost {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: Uuid,
    pub location_id: Option<Uuid>,
    pub image: Option<String>,
}

impl PostForm {
    /// Field checks only. Whether the category and location exist is
    /// decided by the caller against the store.
    pub fn clean(&self) -> Result<CleanPost, FormErrors> {
        let mut errors = FormErrors::new();

        let title = required(&mut errors, "title", &self.title);
        max_length(&mut errors, "title", title, MAX_TITLE_LENGTH);
        let text = required(&mut errors, "text", &self.text);

        let raw_date = required(&mut errors, "pub_date", &self.pub_date);
        let pub_date = if raw_date.is_empty() {
            None
        } else {
            let parsed = parse_datetime(raw_date);
            if parsed.is_none() {
                errors.add("pub_date", "Enter a valid date/time.");
            }
            parsed
        };

        let raw_category = required(&mut errors, "category", &self.category);
        let category_id = if raw_category.is_empty() {
            None
        } else {
            parse_choice(&mut errors, "category", raw_category)
        };

        let raw_location = self.location.trim();
        let location_id = if raw_location.is_empty() {
            None
        } else {
            parse_choice(&mut errors, "location", raw_location)
        };

        let image = self.image.trim();

        match (pub_date, category_id) {
            (Some(pub_date), Some(category_id)) if errors.is_empty() => Ok(CleanPost {
                title: title.to_string(),
                text: text.to_string(),
                pub_date,
                category_id,
                location_id,
                image: (!image.is_empty()).then(|| image.to_string()),
            }),
            _ => Err(errors),
        }
    }
}

/// Comment create/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let text = required(&mut errors, "text", &self.text).to_string();
        errors.into_result(text)
    }
}

/// Own profile form. The username is not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileForm {
    /// Trims every field and checks lengths and the email shape.
    pub fn clean(&self) -> Result<ProfileForm, FormErrors> {
        let mut errors = FormErrors::new();

        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();
        max_length(&mut errors, "first_name", first_name, 150);
        max_length(&mut errors, "last_name", last_name, 150);

        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }

        errors.into_result(ProfileForm {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
        })
    }
}

/// Sign-up form. Passwords are never echoed back to the page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

impl RegistrationForm {
    /// Returns the trimmed username and the password.
    pub fn clean(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();

        let username = required(&mut errors, "username", &self.username).to_string();
        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
                ),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result((username, self.password1.clone()))
    }
}

/// Browser login form. `next` is carried through from the login redirect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub next: String,
}

/// Shown when the credentials match no account.
pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

impl LoginForm {
    /// Returns the trimmed username and the password.
    pub fn clean(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();

        let username = required(&mut errors, "username", &self.username).to_string();
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }

        errors.into_result((username, self.password.clone()))
    }

    /// Where to go after logging in: `next` when it is a path on this site,
    /// otherwise the index.
    pub fn redirect_to(&self) -> &str {
        let next = self.next.trim();
        let local = next.starts_with('/') && !next.starts_with("//") && !next.contains('\\');
        if local { next } else { "/" }
    }
}
