//! Response envelopes.

use serde::{Deserialize, Serialize};

/// A view-model addressed to a template.
///
/// The rendering collaborator turns `context` into the page named by
/// `template`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateResponse<T> {
    pub template: String,
    pub context: T,
}

impl<T> TemplateResponse<T> {
    pub fn new(template: impl Into<String>, context: T) -> Self {
        Self {
            template: template.into(),
            context,
        }
    }
}

/// RFC 7807 problem details.
///
/// Error pages carry this as their context; API-style failures answer with
/// it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    /// Problem for `status`, titled with its canonical reason phrase.
    pub fn for_status(status: u16) -> Self {
        let title = match status {
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            409 => "Conflict",
            _ => "Internal Server Error",
        };
        Self {
            error_type: "about:blank".to_string(),
            title: title.to_string(),
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_body_shape() {
        let body = serde_json::to_value(ErrorResponse::for_status(404).with_detail("Post 7")).unwrap();

        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["title"], "Not Found");
        assert_eq!(body["status"], 404);
        assert_eq!(body["detail"], "Post 7");
    }

    #[test]
    fn test_detail_is_omitted_when_absent() {
        let body = serde_json::to_value(ErrorResponse::for_status(403)).unwrap();

        assert!(body.get("detail").is_none());
    }
}
