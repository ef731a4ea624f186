//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod pages;
mod posts;
mod profile;
mod views;

#[cfg(test)]
mod tests;

use actix_web::{HttpResponse, http::header, web};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use blogicum_core::guard::{self, Owned};
use blogicum_core::{Actor, Authorization};
use blogicum_shared::TemplateResponse;

use crate::middleware::error;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::FormConfig::default().error_handler(error::form_error_handler))
        .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .route("/health", web::get().to(health::health_check))
        .route("/", web::get().to(posts::index))
        .route("/category/{slug}/", web::get().to(posts::category_posts))
        .service(
            web::resource("/posts/create")
                .route(web::get().to(posts::create_post_form))
                .route(web::post().to(posts::create_post)),
        )
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit_post")
                .route(web::get().to(posts::edit_post_form))
                .route(web::post().to(posts::edit_post)),
        )
        .service(
            web::resource("/posts/{post_id}/delete_post")
                .route(web::get().to(posts::delete_post_confirm))
                .route(web::post().to(posts::delete_post)),
        )
        .service(
            web::resource("/posts/{post_id}/comment/")
                .route(web::get().to(comments::add_comment_form))
                .route(web::post().to(comments::add_comment)),
        )
        .service(
            web::resource("/posts/{post_id}/edit_comment/{comment_id}/")
                .route(web::get().to(comments::edit_comment_form))
                .route(web::post().to(comments::edit_comment)),
        )
        .service(
            web::resource("/posts/{post_id}/delete_comment/{comment_id}")
                .route(web::get().to(comments::delete_comment_confirm))
                .route(web::post().to(comments::delete_comment)),
        )
        .service(
            web::resource("/profile/edit_profile")
                .route(web::get().to(profile::edit_profile_form))
                .route(web::post().to(profile::edit_profile)),
        )
        .route("/profile/{username}/", web::get().to(profile::profile))
        .route("/pages/about/", web::get().to(pages::about))
        .route("/pages/rules/", web::get().to(pages::rules))
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/registration/")
                        .route(web::get().to(auth::registration_form))
                        .route(web::post().to(auth::register)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_page))
                        .route(web::post().to(auth::login)),
                )
                .route("/logout/", web::post().to(auth::logout))
                .route("/me/", web::get().to(auth::me)),
        )
        .default_service(web::to(error::not_found));
}

/// URLs of the site's pages.
pub mod urls {
    use std::fmt::Display;

    pub const INDEX: &str = "/";

    pub fn post_detail(post_id: impl Display) -> String {
        format!("/posts/{post_id}/")
    }

    pub fn profile(username: &str) -> String {
        format!("/profile/{username}/")
    }

    /// Login page that returns to `next` afterwards.
    pub fn login(next: &str) -> String {
        format!("/auth/login/?next={next}")
    }
}

/// `?page=` of listing routes, kept raw: the paginator clamps it.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
}

/// 200 with a view-model for `template`.
pub(crate) fn render<T: Serialize>(template: &str, context: T) -> HttpResponse {
    HttpResponse::Ok().json(TemplateResponse::new(template, context))
}

/// 302 to `location`.
pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

/// Ownership check of a mutation. `Some` is the redirect to answer with
/// instead of mutating.
pub(crate) fn refuse_unless_author(
    actor: &Actor,
    entity: &impl Owned,
    post_id: Uuid,
) -> Option<HttpResponse> {
    match guard::authorize_mutation(actor, entity, post_id) {
        Authorization::Allowed => None,
        Authorization::Forbidden { redirect_to } => {
            tracing::warn!(
                user = actor.username().unwrap_or("anonymous"),
                post_id = %redirect_to,
                "Mutation by non-author refused"
            );
            Some(redirect(urls::post_detail(redirect_to)))
        }
    }
}
