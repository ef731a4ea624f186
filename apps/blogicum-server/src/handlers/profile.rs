//! Author profiles.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_core::domain::User;
use blogicum_core::error::DomainError;
use blogicum_core::query::{PostQuery, paginate};
use blogicum_shared::dto::{FormView, ProfileContext, ProfileFormContext};
use blogicum_shared::forms::ProfileForm;

use super::{PageParams, redirect, render, urls, views};
use crate::middleware::auth::{CurrentActor, Identity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| DomainError::not_found("User", &username))?;

    let query = PostQuery::profile(user.id, &actor.0, Utc::now());
    let page = paginate(
        state.posts.as_ref(),
        &query,
        &state.paginator,
        params.page.as_deref(),
    )
    .await?;

    Ok(render(
        "blog/profile.html",
        ProfileContext {
            profile: views::profile_view(&user, actor.0.is(user.id)),
            page_obj: views::page_view(page),
        },
    ))
}

/// GET /profile/edit_profile
pub async fn edit_profile_form(identity: Identity) -> AppResult<HttpResponse> {
    Ok(render(
        "blog/user.html",
        ProfileFormContext {
            form: FormView::new(views::profile_form(&identity.user)),
        },
    ))
}

/// POST /profile/edit_profile
pub async fn edit_profile(
    identity: Identity,
    state: web::Data<AppState>,
    form: web::Form<ProfileForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let clean = match form.clean() {
        Ok(clean) => clean,
        Err(errors) => {
            return Ok(render(
                "blog/user.html",
                ProfileFormContext {
                    form: FormView::with_errors(form, errors),
                },
            ));
        }
    };

    let user = state
        .users
        .update(User {
            first_name: clean.first_name,
            last_name: clean.last_name,
            email: clean.email,
            ..identity.user
        })
        .await?;
    tracing::info!(user = %user.username, "Profile updated");

    Ok(redirect(urls::profile(&user.username)))
}
