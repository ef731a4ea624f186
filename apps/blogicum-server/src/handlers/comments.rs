//! Comment forms. Every route here needs a logged-in user.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::domain::Comment;
use blogicum_core::error::DomainError;
use blogicum_shared::dto::{CommentFormContext, DeleteCommentContext, FormView};
use blogicum_shared::forms::CommentForm;

use super::posts::find_post;
use super::{redirect, refuse_unless_author, render, urls, views};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

const COMMENT_TEMPLATE: &str = "blog/comment.html";

/// GET /posts/{post_id}/comment/
pub async fn add_comment_form(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;

    Ok(render(
        COMMENT_TEMPLATE,
        CommentFormContext {
            post_id: post.id,
            form: FormView::new(CommentForm::default()),
            comment: None,
        },
    ))
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;

    let form = form.into_inner();
    let text = match form.clean() {
        Ok(text) => text,
        Err(errors) => {
            return Ok(render(
                COMMENT_TEMPLATE,
                CommentFormContext {
                    post_id: post.id,
                    form: FormView::with_errors(form, errors),
                    comment: None,
                },
            ));
        }
    };

    let comment = state
        .comments
        .insert(Comment::new(post.id, identity.user.id, text))
        .await?;
    tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");

    Ok(redirect(urls::post_detail(post.id)))
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = find_comment(&state, post_id, comment_id).await?;
    if let Some(refusal) = refuse_unless_author(&identity.actor(), &comment, post_id) {
        return Ok(refusal);
    }

    Ok(render(
        COMMENT_TEMPLATE,
        CommentFormContext {
            post_id,
            form: FormView::new(views::comment_form(&comment)),
            comment: Some(views::comment_view(&comment, Some(&identity.user))),
        },
    ))
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = find_comment(&state, post_id, comment_id).await?;
    if let Some(refusal) = refuse_unless_author(&identity.actor(), &comment, post_id) {
        return Ok(refusal);
    }

    let form = form.into_inner();
    let text = match form.clean() {
        Ok(text) => text,
        Err(errors) => {
            return Ok(render(
                COMMENT_TEMPLATE,
                CommentFormContext {
                    post_id,
                    form: FormView::with_errors(form, errors),
                    comment: Some(views::comment_view(&comment, Some(&identity.user))),
                },
            ));
        }
    };

    state.comments.update(Comment { text, ..comment }).await?;
    tracing::info!(%comment_id, %post_id, "Comment updated");

    Ok(redirect(urls::post_detail(post_id)))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}
pub async fn delete_comment_confirm(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = find_comment(&state, post_id, comment_id).await?;
    if let Some(refusal) = refuse_unless_author(&identity.actor(), &comment, post_id) {
        return Ok(refusal);
    }

    Ok(render(
        COMMENT_TEMPLATE,
        DeleteCommentContext {
            post_id,
            comment: views::comment_view(&comment, Some(&identity.user)),
        },
    ))
}

/// POST /posts/{post_id}/delete_comment/{comment_id}
pub async fn delete_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = find_comment(&state, post_id, comment_id).await?;
    if let Some(refusal) = refuse_unless_author(&identity.actor(), &comment, post_id) {
        return Ok(refusal);
    }

    state.comments.delete(comment.id).await?;
    tracing::info!(%comment_id, %post_id, "Comment deleted");

    Ok(redirect(urls::post_detail(post_id)))
}

/// The comment, provided it belongs to `post_id`.
async fn find_comment(state: &AppState, post_id: Uuid, comment_id: Uuid) -> AppResult<Comment> {
    let comment = state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|comment| comment.post_id == post_id)
        .ok_or_else(|| DomainError::not_found("Comment", comment_id))?;
    Ok(comment)
}
