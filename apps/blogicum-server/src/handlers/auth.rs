//! Registration, login and the current identity.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{Either, HttpResponse, web};
use serde::Deserialize;
use std::sync::Arc;

use blogicum_core::domain::User;
use blogicum_core::ports::{IssuedToken, PasswordService, TokenService};
use blogicum_shared::FormErrors;
use blogicum_shared::dto::{
    AuthResponse, FormView, LoginPageContext, LoginRequest, RegistrationContext,
};
use blogicum_shared::forms::{INVALID_LOGIN, LoginForm, RegistrationForm};

use super::{redirect, render, urls, views};
use crate::middleware::auth::{Identity, TOKEN_COOKIE};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const REGISTRATION_TEMPLATE: &str = "registration/registration_form.html";
const LOGIN_TEMPLATE: &str = "registration/login.html";

/// GET /auth/registration/
pub async fn registration_form() -> HttpResponse {
    render(
        REGISTRATION_TEMPLATE,
        RegistrationContext {
            form: FormView::new(RegistrationForm::default()),
        },
    )
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    form: web::Form<RegistrationForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let (username, password) = match form.clean() {
        Ok(clean) => clean,
        Err(errors) => return Ok(registration_page(form, errors)),
    };

    let mut errors = FormErrors::new();
    if !User::is_valid_username(&username) {
        errors.add(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    } else if state.users.find_by_username(&username).await?.is_some() {
        errors.add("username", "A user with that username already exists.");
    }
    if !errors.is_empty() {
        return Ok(registration_page(form, errors));
    }

    let password_hash = password_service
        .make_password(&password)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let user = state.users.insert(User::new(username, password_hash)).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    Ok(redirect(urls::INDEX))
}

fn registration_page(form: RegistrationForm, errors: FormErrors) -> HttpResponse {
    render(
        REGISTRATION_TEMPLATE,
        RegistrationContext {
            form: FormView::with_errors(form, errors),
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct LoginParams {
    pub next: Option<String>,
}

/// GET /auth/login/
pub async fn login_page(params: web::Query<LoginParams>) -> HttpResponse {
    let form = LoginForm {
        next: params.into_inner().next.unwrap_or_default(),
        ..LoginForm::default()
    };
    login_form_page(form, FormErrors::new())
}

fn login_form_page(form: LoginForm, errors: FormErrors) -> HttpResponse {
    render(
        LOGIN_TEMPLATE,
        LoginPageContext {
            form: FormView::with_errors(form, errors),
        },
    )
}

/// POST /auth/login/
///
/// A JSON body answers with the token. A submitted login form gets the
/// token as an HTTP-only cookie and is redirected to its `next` page.
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    body: Either<web::Json<LoginRequest>, web::Form<LoginForm>>,
) -> AppResult<HttpResponse> {
    let tokens = token_service.get_ref().as_ref();
    let passwords = password_service.get_ref().as_ref();

    match body {
        Either::Left(json) => {
            let req = json.into_inner();
            let user = authenticate(&state, passwords, &req.username, &req.password)
                .await?
                .ok_or(AppError::Unauthorized)?;
            let issued = issue_session(tokens, &user)?;

            Ok(HttpResponse::Ok()
                .cookie(session_cookie(&issued))
                .json(AuthResponse {
                    access_token: issued.token,
                    token_type: "Bearer".to_string(),
                    expires_in: issued.expires_in.max(0) as u64,
                }))
        }
        Either::Right(form) => {
            let form = form.into_inner();
            let (username, password) = match form.clean() {
                Ok(clean) => clean,
                Err(errors) => return Ok(login_form_page(form, errors)),
            };

            let Some(user) = authenticate(&state, passwords, &username, &password).await? else {
                let mut errors = FormErrors::new();
                errors.add("__all__", INVALID_LOGIN);
                return Ok(login_form_page(form, errors));
            };
            let issued = issue_session(tokens, &user)?;

            let mut response = redirect(form.redirect_to());
            if let Err(e) = response.add_cookie(&session_cookie(&issued)) {
                tracing::error!("Failed to set session cookie: {}", e);
            }
            Ok(response)
        }
    }
}

/// The account named `username`, if `password` is its password.
async fn authenticate(
    state: &AppState,
    password_service: &dyn PasswordService,
    username: &str,
    password: &str,
) -> AppResult<Option<User>> {
    let Some(user) = state.users.find_by_username(username.trim()).await? else {
        return Ok(None);
    };

    let valid = password_service
        .check_password(password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::warn!(username = %user.username, "Login with wrong password");
        return Ok(None);
    }
    Ok(Some(user))
}

fn issue_session(token_service: &dyn TokenService, user: &User) -> AppResult<IssuedToken> {
    let issued = token_service
        .issue(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(issued)
}

fn session_cookie(issued: &IssuedToken) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, issued.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(issued.expires_in))
        .finish()
}

/// POST /auth/logout/
pub async fn logout() -> HttpResponse {
    let cookie = Cookie::build(TOKEN_COOKIE, "")
        .path("/")
        .max_age(Duration::ZERO)
        .finish();

    let mut response = redirect(urls::INDEX);
    // An expired cookie with the same name and path clears the session.
    if let Err(e) = response.add_cookie(&cookie) {
        tracing::error!("Failed to clear session cookie: {}", e);
    }
    response
}

/// GET /auth/me/
pub async fn me(identity: Identity) -> HttpResponse {
    HttpResponse::Ok().json(views::user_response(&identity.user))
}
