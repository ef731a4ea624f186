//! Domain → view-model conversions.

use chrono::SecondsFormat;

use blogicum_core::domain::{Category, Comment, Location, Post, User};
use blogicum_core::query::CommentCard;
use blogicum_core::{Page, PostCard};
use blogicum_shared::dto::{
    AuthorView, CategoryView, ChoiceView, CommentView, LocationView, PageView, PostView,
    ProfileView, UserResponse,
};
use blogicum_shared::forms::{CommentForm, PostForm, ProfileForm};

pub fn author_view(user: &User) -> AuthorView {
    AuthorView {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

pub fn profile_view(user: &User, is_owner: bool) -> ProfileView {
    let author = author_view(user);
    ProfileView {
        full_name: author.full_name(),
        author,
        date_joined: user.created_at,
        is_owner,
    }
}

pub fn category_view(category: &Category) -> CategoryView {
    CategoryView {
        id: category.id,
        title: category.title.clone(),
        description: category.description.clone(),
        slug: category.slug.clone(),
    }
}

pub fn location_view(location: &Location) -> LocationView {
    LocationView {
        id: location.id,
        name: location.name.clone(),
    }
}

pub fn post_view(card: &PostCard) -> PostView {
    let post = &card.post;
    PostView {
        id: post.id,
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: post.pub_date,
        author: card.author.as_ref().map(author_view),
        category: card.category.as_ref().map(category_view),
        location: card.location.as_ref().map(location_view),
        image: post.image.clone(),
        is_published: post.is_published,
        comment_count: card.comment_count.unwrap_or_default(),
    }
}

pub fn comment_view(comment: &Comment, author: Option<&User>) -> CommentView {
    CommentView {
        id: comment.id,
        post_id: comment.post_id,
        text: comment.text.clone(),
        created_at: comment.created_at,
        author: author.map(author_view),
    }
}

pub fn comment_card_view(card: &CommentCard) -> CommentView {
    comment_view(&card.comment, card.author.as_ref())
}

pub fn page_view(page: Page<PostCard>) -> PageView<PostView> {
    PageView {
        number: page.number,
        num_pages: page.num_pages,
        count: page.count,
        has_next: page.has_next(),
        has_previous: page.has_previous(),
        next_page_number: page.next_page_number(),
        previous_page_number: page.previous_page_number(),
        start_index: page.start_index(),
        end_index: page.end_index(),
        object_list: page.items.iter().map(post_view).collect(),
    }
}

/// Form values of an existing post, as the edit page pre-fills them.
pub fn post_form(post: &Post) -> PostForm {
    PostForm {
        title: post.title.clone(),
        text: post.text.clone(),
        pub_date: post.pub_date.to_rfc3339_opts(SecondsFormat::Secs, true),
        category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
        location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
        image: post.image.clone().unwrap_or_default(),
    }
}

pub fn comment_form(comment: &Comment) -> CommentForm {
    CommentForm {
        text: comment.text.clone(),
    }
}

pub fn profile_form(user: &User) -> ProfileForm {
    ProfileForm {
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    }
}

pub fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
    }
}

/// Select options; `selected` holds the submitted raw value.
pub fn choices<T>(
    items: &[T],
    selected: &str,
    value: impl Fn(&T) -> String,
    label: impl Fn(&T) -> String,
) -> Vec<ChoiceView> {
    items
        .iter()
        .map(|item| {
            let value = value(item);
            ChoiceView {
                selected: value == selected.trim(),
                label: label(item),
                value,
            }
        })
        .collect()
}
