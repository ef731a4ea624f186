//! Request-level tests against the in-memory store.

use std::sync::Arc;

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use uuid::Uuid;

use blogicum_core::Paginator;
use blogicum_core::domain::{Category, Comment, Post, User};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{BaseRepository, PasswordService, TokenService, UserRepository};
use blogicum_infra::{Argon2PasswordService, InMemoryDatabase, JwtConfig, JwtTokenService};
use blogicum_shared::dto::LoginRequest;
use blogicum_shared::forms::{CommentForm, PostForm};

use super::configure_routes;
use crate::middleware::auth::TOKEN_COOKIE;
use crate::state::AppState;

struct Fixture {
    state: AppState,
    tokens: Arc<dyn TokenService>,
    passwords: Arc<dyn PasswordService>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            state: AppState::in_memory(&InMemoryDatabase::new(), Paginator::new(10)),
            tokens: Arc::new(JwtTokenService::new(JwtConfig::default())),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }

    async fn user(&self, username: &str) -> User {
        let user = User::new(username.to_string(), "not-a-real-hash".to_string());
        self.state.users.insert(user).await.unwrap()
    }

    fn bearer(&self, user: &User) -> String {
        let issued = self.tokens.issue(user.id, &user.username).unwrap();
        format!("Bearer {}", issued.token)
    }

    async fn category(&self, slug: &str, is_published: bool) -> Category {
        let mut category = Category::new(slug.to_uppercase(), String::new(), slug.to_string()).unwrap();
        category.is_published = is_published;
        self.state.categories.insert(category).await.unwrap()
    }

    async fn post(&self, author: &User, category: &Category, pub_date: DateTime<Utc>) -> Post {
        let post = Post::new(
            author.id,
            "Title".to_string(),
            "Text".to_string(),
            pub_date,
            Some(category.id),
        );
        self.state.posts.insert(post).await.unwrap()
    }

    async fn comment(&self, author: &User, post: &Post, text: &str) -> Comment {
        let comment = Comment::new(post.id, author.id, text.to_string());
        self.state.comments.insert(comment).await.unwrap()
    }
}

macro_rules! init_app {
    ($fixture:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($fixture.state.clone()))
                .app_data(web::Data::new($fixture.tokens.clone()))
                .app_data(web::Data::new($fixture.passwords.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn yesterday() -> DateTime<Utc> {
    Utc::now() - TimeDelta::days(1)
}

fn location<B>(res: &ServiceResponse<B>) -> &str {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn listed_ids(body: &Value) -> Vec<String> {
    body["context"]["page_obj"]["object_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["id"].as_str().unwrap().to_string())
        .collect()
}

fn valid_post_form(category: &Category) -> PostForm {
    PostForm {
        title: "Edited".to_string(),
        text: "Edited text".to_string(),
        pub_date: "2024-09-28T15:38".to_string(),
        category: category.id.to_string(),
        ..Default::default()
    }
}

#[actix_rt::test]
async fn test_index_lists_only_public_posts() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let open = fx.category("open", true).await;
    let hidden = fx.category("hidden", false).await;

    let visible = fx.post(&author, &open, yesterday()).await;
    let mut unpublished = fx.post(&author, &open, yesterday()).await;
    unpublished.is_published = false;
    fx.state.posts.update(unpublished).await.unwrap();
    fx.post(&author, &hidden, yesterday()).await;
    fx.post(&author, &open, Utc::now() + TimeDelta::days(1)).await;
    fx.comment(&author, &visible, "first").await;

    let app = init_app!(fx);
    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["template"], "blog/index.html");
    assert_eq!(listed_ids(&body), vec![visible.id.to_string()]);
    assert_eq!(body["context"]["page_obj"]["object_list"][0]["comment_count"], 1);
    assert_eq!(
        body["context"]["page_obj"]["object_list"][0]["author"]["username"],
        "author"
    );
}

#[actix_rt::test]
async fn test_category_scenario() {
    let fx = Fixture::new();
    let u1 = fx.user("u1").await;
    let u2 = fx.user("u2").await;
    let news = fx.category("news", true).await;

    let p1 = fx.post(&u1, &news, yesterday()).await;
    let mut p2 = fx.post(&u1, &news, yesterday()).await;
    p2.is_published = false;
    let p2 = fx.state.posts.update(p2).await.unwrap();

    let app = init_app!(fx);

    let req = test::TestRequest::get().uri("/category/news/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["context"]["category"]["slug"], "news");
    assert_eq!(listed_ids(&body), vec![p1.id.to_string()]);

    let detail = format!("/posts/{}/", p2.id);

    let req = test::TestRequest::get()
        .uri(&detail)
        .insert_header((header::AUTHORIZATION, fx.bearer(&u1)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["template"], "blog/detail.html");
    assert_eq!(body["context"]["post"]["id"], p2.id.to_string());

    let req = test::TestRequest::get()
        .uri(&detail)
        .insert_header((header::AUTHORIZATION, fx.bearer(&u2)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["template"], "pages/404.html");

    let req = test::TestRequest::get().uri(&detail).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_unknown_or_hidden_category_is_not_found() {
    let fx = Fixture::new();
    fx.category("hidden", false).await;
    let app = init_app!(fx);

    for uri in ["/category/hidden/", "/category/missing/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[actix_rt::test]
async fn test_scheduled_post_visible_to_author_only() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let reader = fx.user("reader").await;
    let open = fx.category("open", true).await;
    let scheduled = fx.post(&author, &open, Utc::now() + TimeDelta::days(7)).await;

    let app = init_app!(fx);
    let detail = format!("/posts/{}/", scheduled.id);

    let req = test::TestRequest::get()
        .uri(&detail)
        .insert_header((header::AUTHORIZATION, fx.bearer(&author)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&detail)
        .insert_header((header::AUTHORIZATION, fx.bearer(&reader)))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_detail_lists_comments_in_order() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let open = fx.category("open", true).await;
    let post = fx.post(&author, &open, yesterday()).await;
    for text in ["one", "two", "three"] {
        fx.comment(&author, &post, text).await;
    }

    let app = init_app!(fx);
    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", post.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let comments = body["context"]["comments"].as_array().unwrap();
    let created: Vec<DateTime<Utc>> = comments
        .iter()
        .map(|c| c["created_at"].as_str().unwrap().parse().unwrap())
        .collect();
    assert!(created.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(comments.len(), 3);
    assert!(body["context"]["form"].is_null());
}

#[actix_rt::test]
async fn test_forbidden_post_mutations_redirect_and_change_nothing() {
    let fx = Fixture::new();
    let owner = fx.user("owner").await;
    let intruder = fx.user("intruder").await;
    let open = fx.category("open", true).await;
    let post = fx.post(&owner, &open, yesterday()).await;

    let app = init_app!(fx);
    let detail = format!("/posts/{}/", post.id);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit_post", post.id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&intruder)))
        .set_form(valid_post_form(&open))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), detail);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete_post", post.id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&intruder)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), detail);

    let stored = fx.state.posts.find_by_id(post.id).await.unwrap();
    assert_eq!(stored, Some(post));
}

#[actix_rt::test]
async fn test_forbidden_comment_mutations_redirect_and_change_nothing() {
    let fx = Fixture::new();
    let owner = fx.user("owner").await;
    let intruder = fx.user("intruder").await;
    let open = fx.category("open", true).await;
    let post = fx.post(&owner, &open, yesterday()).await;
    let comment = fx.comment(&owner, &post, "mine").await;

    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit_comment/{}/", post.id, comment.id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&intruder)))
        .set_form(CommentForm {
            text: "hijacked".to_string(),
        })
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), format!("/posts/{}/", post.id));

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete_comment/{}", post.id, comment.id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&intruder)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let stored = fx.state.comments.find_by_id(comment.id).await.unwrap();
    assert_eq!(stored, Some(comment));
}

#[actix_rt::test]
async fn test_author_edits_and_deletes_post() {
    let fx = Fixture::new();
    let owner = fx.user("owner").await;
    let open = fx.category("open", true).await;
    let post = fx.post(&owner, &open, yesterday()).await;
    fx.comment(&owner, &post, "soon gone").await;

    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit_post", post.id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&owner)))
        .set_form(valid_post_form(&open))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    let edited = fx.state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(edited.title, "Edited");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete_post", post.id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&owner)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profile/owner/");

    assert!(fx.state.posts.find_by_id(post.id).await.unwrap().is_none());
    assert!(fx.state.comments.list_for_post(post.id).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_anonymous_mutation_redirects_to_login() {
    let fx = Fixture::new();
    let open = fx.category("open", true).await;
    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri("/posts/create")
        .set_form(valid_post_form(&open))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/auth/login/?next=/posts/create");

    let count = fx
        .state
        .posts
        .count(&blogicum_core::PostQuery::new())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[actix_rt::test]
async fn test_invalid_post_form_rerenders_without_writing() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let open = fx.category("open", true).await;
    let app = init_app!(fx);

    let form = PostForm {
        title: String::new(),
        ..valid_post_form(&open)
    };
    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, fx.bearer(&author)))
        .set_form(form)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["template"], "blog/create.html");
    assert!(body["context"]["form"]["errors"]["title"].is_array());
    assert_eq!(body["context"]["categories"][0]["selected"], true);

    let count = fx
        .state
        .posts
        .count(&blogicum_core::PostQuery::new())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[actix_rt::test]
async fn test_unknown_category_choice_is_a_form_error() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let open = fx.category("open", true).await;
    let app = init_app!(fx);

    let form = PostForm {
        category: Uuid::new_v4().to_string(),
        ..valid_post_form(&open)
    };
    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, fx.bearer(&author)))
        .set_form(form)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert!(body["context"]["form"]["errors"]["category"].is_array());
}

#[actix_rt::test]
async fn test_create_post_redirects_to_profile() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let open = fx.category("open", true).await;
    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, fx.bearer(&author)))
        .set_form(valid_post_form(&open))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profile/author/");
    let count = fx
        .state
        .posts
        .count(&blogicum_core::PostQuery::new().by_author(author.id))
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[actix_rt::test]
async fn test_listing_pages_are_clamped() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let open = fx.category("open", true).await;

    let now = Utc::now();
    let mut newest_first = Vec::new();
    for i in 1..=25 {
        let post = fx.post(&author, &open, now - TimeDelta::hours(i)).await;
        newest_first.push(post.id.to_string());
    }

    let app = init_app!(fx);
    let page = |query: &'static str| test::TestRequest::get().uri(query).to_request();

    let body: Value = test::call_and_read_body_json(&app, page("/")).await;
    assert_eq!(listed_ids(&body), newest_first[..10]);

    let body: Value = test::call_and_read_body_json(&app, page("/?page=3")).await;
    assert_eq!(listed_ids(&body), newest_first[20..]);

    let body: Value = test::call_and_read_body_json(&app, page("/?page=99")).await;
    assert_eq!(body["context"]["page_obj"]["number"], 3);
    assert_eq!(listed_ids(&body), newest_first[20..]);

    for query in ["/?page=abc", "/?page=0", "/?page=-4"] {
        let body: Value = test::call_and_read_body_json(&app, page(query)).await;
        assert_eq!(body["context"]["page_obj"]["number"], 1, "{query}");
    }
}

#[actix_rt::test]
async fn test_profile_hides_unpublished_posts_from_others() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let reader = fx.user("reader").await;
    let open = fx.category("open", true).await;

    let public = fx.post(&author, &open, yesterday()).await;
    let mut draft = fx.post(&author, &open, yesterday() - TimeDelta::hours(1)).await;
    draft.is_published = false;
    let draft = fx.state.posts.update(draft).await.unwrap();

    let app = init_app!(fx);

    let req = test::TestRequest::get()
        .uri("/profile/author/")
        .insert_header((header::AUTHORIZATION, fx.bearer(&author)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        listed_ids(&body),
        vec![public.id.to_string(), draft.id.to_string()]
    );
    assert_eq!(body["context"]["profile"]["is_owner"], true);

    let req = test::TestRequest::get()
        .uri("/profile/author/")
        .insert_header((header::AUTHORIZATION, fx.bearer(&reader)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed_ids(&body), vec![public.id.to_string()]);

    let req = test::TestRequest::get().uri("/profile/nobody/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_comment_flow() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let reader = fx.user("reader").await;
    let open = fx.category("open", true).await;
    let post = fx.post(&author, &open, yesterday()).await;
    let other = fx.post(&author, &open, yesterday()).await;

    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&reader)))
        .set_form(CommentForm {
            text: "Nice".to_string(),
        })
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), format!("/posts/{}/", post.id));

    let thread = fx.state.comments.list_for_post(post.id).await.unwrap();
    assert_eq!(thread.len(), 1);
    let comment_id = thread[0].comment.id;

    // A comment addressed through another post does not exist.
    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit_comment/{}/", other.id, comment_id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&reader)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment/", post.id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&reader)))
        .set_form(CommentForm {
            text: "   ".to_string(),
        })
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["template"], "blog/comment.html");
    assert!(body["context"]["form"]["errors"]["text"].is_array());

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete_comment/{}", post.id, comment_id))
        .insert_header((header::AUTHORIZATION, fx.bearer(&reader)))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert!(fx.state.comments.find_by_id(comment_id).await.unwrap().is_none());
}

#[actix_rt::test]
async fn test_edit_profile() {
    let fx = Fixture::new();
    let user = fx.user("leo").await;
    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri("/profile/edit_profile")
        .insert_header((header::AUTHORIZATION, fx.bearer(&user)))
        .set_form([("first_name", "Leo"), ("last_name", "Tolstoy"), ("email", "leo@example.com")])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/profile/leo/");

    let stored = fx.state.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.last_name, "Tolstoy");
    assert_eq!(stored.password_hash, user.password_hash);
}

#[actix_rt::test]
async fn test_register_login_and_me() {
    let fx = Fixture::new();
    fx.user("taken").await;
    let app = init_app!(fx);

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_form([
            ("username", "taken"),
            ("password1", "long enough"),
            ("password2", "long enough"),
        ])
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["context"]["form"]["errors"]["username"].is_array());
    assert!(body["context"]["form"]["data"].get("password1").is_none());

    let req = test::TestRequest::post()
        .uri("/auth/registration/")
        .set_form([
            ("username", "newcomer"),
            ("password1", "long enough"),
            ("password2", "long enough"),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/");

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(LoginRequest {
            username: "newcomer".to_string(),
            password: "wrong password".to_string(),
        })
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_json(LoginRequest {
            username: "newcomer".to_string(),
            password: "long enough".to_string(),
        })
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap();

    let req = test::TestRequest::get()
        .uri("/auth/me/")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "newcomer");
}

#[actix_rt::test]
async fn test_form_login_returns_to_next_page() {
    let fx = Fixture::new();
    let hash = fx.passwords.make_password("long enough").unwrap();
    fx.state
        .users
        .insert(User::new("leo".to_string(), hash))
        .await
        .unwrap();
    let app = init_app!(fx);

    let req = test::TestRequest::get()
        .uri("/auth/login/?next=/posts/create")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["template"], "registration/login.html");
    assert_eq!(body["context"]["form"]["data"]["next"], "/posts/create");

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([
            ("username", "leo"),
            ("password", "wrong password"),
            ("next", "/posts/create"),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.response().cookies().next().is_none());
    let body: Value = test::read_body_json(res).await;
    assert!(body["context"]["form"]["errors"]["__all__"].is_array());
    assert!(body["context"]["form"]["data"].get("password").is_none());

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([
            ("username", "leo"),
            ("password", "long enough"),
            ("next", "/posts/create"),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/posts/create");
    let session = res
        .response()
        .cookies()
        .find(|c| c.name() == TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/posts/create")
        .cookie(actix_web::cookie::Cookie::new(TOKEN_COOKIE, session))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([
            ("username", "leo"),
            ("password", "long enough"),
            ("next", "https://elsewhere.example/"),
        ])
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(location(&res), "/");
}

#[actix_rt::test]
async fn test_deleted_user_token_is_anonymous() {
    let fx = Fixture::new();
    let user = fx.user("ghost").await;
    let bearer = fx.bearer(&user);
    fx.state.users.delete(user.id).await.unwrap();

    let app = init_app!(fx);
    let req = test::TestRequest::get()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "/auth/login/?next=/posts/create");
}

/// A user store whose connection is gone.
struct UnreachableUsers;

#[async_trait::async_trait]
impl BaseRepository<User, Uuid> for UnreachableUsers {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, RepoError> {
        Err(RepoError::Connection("connection refused".to_string()))
    }

    async fn insert(&self, _entity: User) -> Result<User, RepoError> {
        Err(RepoError::Connection("connection refused".to_string()))
    }

    async fn update(&self, _entity: User) -> Result<User, RepoError> {
        Err(RepoError::Connection("connection refused".to_string()))
    }

    async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
        Err(RepoError::Connection("connection refused".to_string()))
    }
}

#[async_trait::async_trait]
impl UserRepository for UnreachableUsers {
    async fn find_by_username(&self, _username: &str) -> Result<Option<User>, RepoError> {
        Err(RepoError::Connection("connection refused".to_string()))
    }
}

#[actix_rt::test]
async fn test_user_store_failure_is_a_server_error_not_anonymity() {
    let fx = Fixture::new();
    let author = fx.user("leo").await;
    let news = fx.category("news", true).await;
    let mut hidden = fx.post(&author, &news, yesterday()).await;
    hidden.is_published = false;
    fx.state.posts.update(hidden.clone()).await.unwrap();
    let bearer = fx.bearer(&author);

    let fx = Fixture {
        state: AppState {
            users: Arc::new(UnreachableUsers),
            ..fx.state.clone()
        },
        ..fx
    };
    let app = init_app!(fx);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", hidden.id))
        .insert_header((header::AUTHORIZATION, bearer.clone()))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["template"], "pages/500.html");

    let req = test::TestRequest::get()
        .uri("/posts/create")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // Without a session the store is never consulted.
    let req = test::TestRequest::get().uri("/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_static_pages_and_fallbacks() {
    let fx = Fixture::new();
    let app = init_app!(fx);

    let req = test::TestRequest::get().uri("/pages/rules/").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["template"], "pages/rules.html");

    let req = test::TestRequest::get().uri("/posts/not-a-uuid/").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/no/such/page").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["template"], "pages/404.html");

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["storage"], "in-memory");
}
