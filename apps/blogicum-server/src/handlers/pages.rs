//! Static pages.

use actix_web::HttpResponse;

use blogicum_shared::dto::EmptyContext;

use super::render;

/// GET /pages/about/
pub async fn about() -> HttpResponse {
    render("pages/about.html", EmptyContext::default())
}

/// GET /pages/rules/
pub async fn rules() -> HttpResponse {
    render("pages/rules.html", EmptyContext::default())
}
