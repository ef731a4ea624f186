//! Post listings, detail and the author's post forms.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use uuid::Uuid;

use blogicum_core::PostCard;
use blogicum_core::domain::Post;
use blogicum_core::error::DomainError;
use blogicum_core::query::{PostQuery, paginate};
use blogicum_shared::FormErrors;
use blogicum_shared::dto::{
    CategoryContext, DeletePostContext, DetailContext, FormView, IndexContext, PostFormContext,
};
use blogicum_shared::forms::{CleanPost, CommentForm, INVALID_CHOICE, PostForm};

use super::{PageParams, redirect, refuse_unless_author, render, urls, views};
use crate::middleware::auth::{CurrentActor, Identity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

const POST_FORM_TEMPLATE: &str = "blog/create.html";

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    params: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let query = PostQuery::index(Utc::now());
    let page = paginate(
        state.posts.as_ref(),
        &query,
        &state.paginator,
        params.page.as_deref(),
    )
    .await?;

    tracing::debug!(page = page.number, count = page.count, "Index listing");

    Ok(render(
        "blog/index.html",
        IndexContext {
            page_obj: views::page_view(page),
        },
    ))
}

/// GET /category/{slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .filter(|category| category.is_published)
        .ok_or_else(|| DomainError::not_found("Category", &slug))?;

    let query = PostQuery::category(slug, Utc::now());
    let page = paginate(
        state.posts.as_ref(),
        &query,
        &state.paginator,
        params.page.as_deref(),
    )
    .await?;

    Ok(render(
        "blog/category.html",
        CategoryContext {
            category: views::category_view(&category),
            page_obj: views::page_view(page),
        },
    ))
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    actor: CurrentActor,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    let post_id = post.id;

    let query = PostQuery::detail(&post, &actor.0, Utc::now());
    let card = state
        .posts
        .fetch(&query, None)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    let comments = card
        .comments
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(views::comment_card_view)
        .collect();

    Ok(render(
        "blog/detail.html",
        DetailContext {
            post: views::post_view(&card),
            form: actor
                .0
                .is_authenticated()
                .then(|| FormView::new(CommentForm::default())),
            comments,
        },
    ))
}

/// GET /posts/create
pub async fn create_post_form(
    _identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    post_form_page(&state, FormView::new(PostForm::default()), None).await
}

/// POST /posts/create
pub async fn create_post(
    identity: Identity,
    state: web::Data<AppState>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let clean = match clean_post_form(&state, &form).await? {
        Ok(clean) => clean,
        Err(errors) => {
            return post_form_page(&state, FormView::with_errors(form, errors), None).await;
        }
    };

    let post = Post::new(
        identity.user.id,
        clean.title,
        clean.text,
        clean.pub_date,
        Some(clean.category_id),
    )
    .with_location(clean.location_id)
    .with_image(clean.image);
    let post = state.posts.insert(post).await?;

    tracing::info!(post_id = %post.id, author = %identity.user.username, "Post created");

    Ok(redirect(urls::profile(&identity.user.username)))
}

/// GET /posts/{post_id}/edit_post
pub async fn edit_post_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    if let Some(refusal) = refuse_unless_author(&identity.actor(), &post, post.id) {
        return Ok(refusal);
    }

    let form = FormView::new(views::post_form(&post));
    post_form_page(&state, form, Some(post)).await
}

/// POST /posts/{post_id}/edit_post
pub async fn edit_post(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    if let Some(refusal) = refuse_unless_author(&identity.actor(), &post, post.id) {
        return Ok(refusal);
    }

    let form = form.into_inner();
    let clean = match clean_post_form(&state, &form).await? {
        Ok(clean) => clean,
        Err(errors) => {
            return post_form_page(&state, FormView::with_errors(form, errors), Some(post)).await;
        }
    };

    // A blank image field keeps the stored image.
    let image = clean.image.or_else(|| post.image.clone());
    let post = state
        .posts
        .update(Post {
            title: clean.title,
            text: clean.text,
            pub_date: clean.pub_date,
            category_id: Some(clean.category_id),
            location_id: clean.location_id,
            image,
            ..post
        })
        .await?;

    tracing::info!(post_id = %post.id, "Post updated");

    Ok(redirect(urls::post_detail(post.id)))
}

/// GET /posts/{post_id}/delete_post
pub async fn delete_post_confirm(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    if let Some(refusal) = refuse_unless_author(&identity.actor(), &post, post.id) {
        return Ok(refusal);
    }

    Ok(render(
        POST_FORM_TEMPLATE,
        DeletePostContext {
            instance: views::post_view(&PostCard::bare(post)),
        },
    ))
}

/// POST /posts/{post_id}/delete_post
pub async fn delete_post(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    if let Some(refusal) = refuse_unless_author(&identity.actor(), &post, post.id) {
        return Ok(refusal);
    }

    state.posts.delete(post.id).await?;
    tracing::info!(post_id = %post.id, "Post deleted");

    Ok(redirect(urls::profile(&identity.user.username)))
}

pub(super) async fn find_post(state: &AppState, post_id: Uuid) -> AppResult<Post> {
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;
    Ok(post)
}

/// Field checks, then the category and location must exist.
async fn clean_post_form(
    state: &AppState,
    form: &PostForm,
) -> AppResult<Result<CleanPost, FormErrors>> {
    let clean = match form.clean() {
        Ok(clean) => clean,
        Err(errors) => return Ok(Err(errors)),
    };

    let mut errors = FormErrors::new();
    if state.categories.find_by_id(clean.category_id).await?.is_none() {
        errors.add("category", INVALID_CHOICE);
    }
    if let Some(location_id) = clean.location_id {
        if state.locations.find_by_id(location_id).await?.is_none() {
            errors.add("location", INVALID_CHOICE);
        }
    }

    Ok(errors.into_result(clean))
}

async fn post_form_page(
    state: &AppState,
    form: FormView<PostForm>,
    instance: Option<Post>,
) -> AppResult<HttpResponse> {
    let categories = state.categories.list_all().await?;
    let locations = state.locations.list_all().await?;

    let context = PostFormContext {
        categories: views::choices(
            &categories,
            &form.data.category,
            |c| c.id.to_string(),
            |c| c.title.clone(),
        ),
        locations: views::choices(
            &locations,
            &form.data.location,
            |l| l.id.to_string(),
            |l| l.name.clone(),
        ),
        instance: instance.map(|post| views::post_view(&PostCard::bare(post))),
        form,
    };

    Ok(render(POST_FORM_TEMPLATE, context))
}
