//! Authentication extractors.
//!
//! The bearer token comes from the `Authorization` header or, for browser
//! sessions, from the `access_token` cookie set at login. Its subject is
//! resolved to a live user on every request.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};
use futures::future::LocalBoxFuture;

use blogicum_core::Actor;
use blogicum_core::domain::User;
use blogicum_core::ports::{AuthError, TokenService};

use crate::handlers::urls;
use crate::middleware::error::AppError;
use crate::state::AppState;

/// Cookie carrying the bearer token for browser sessions.
pub const TOKEN_COOKIE: &str = "access_token";

/// Authenticated user identity extractor.
///
/// Requests without a valid identity are redirected to the login page
/// before the handler runs:
/// ```ignore
/// async fn create_post(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
}

impl Identity {
    pub fn actor(&self) -> Actor {
        Actor::user(self.user.id, self.user.username.clone())
    }
}

/// Authentication failure: send the visitor to log in, then back to `next`.
#[derive(Debug)]
pub struct AuthenticationError {
    pub cause: AuthError,
    pub next: String,
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        tracing::debug!(cause = %self.cause, next = %self.next, "Redirecting to login");

        HttpResponse::Found()
            .insert_header((header::LOCATION, urls::login(&self.next)))
            .finish()
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let auth_str = value
            .to_str()
            .map_err(|_| AuthError::Malformed("authorization header is not ASCII".to_string()))?;

        return auth_str
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or_else(|| AuthError::Malformed("expected a Bearer token".to_string()));
    }

    req.cookie(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AuthError::NoCredentials)
}

/// Outcome of reading the session off a request.
enum Resolved {
    User(User),
    /// No usable session: missing, malformed or expired token, or a deleted user.
    Anonymous(AuthError),
}

/// Resolve the request's session to a live user.
///
/// Store and configuration failures are errors, not anonymity.
fn resolve(req: &HttpRequest) -> LocalBoxFuture<'static, Result<Resolved, AppError>> {
    let token = bearer_token(req);
    let token_service = req
        .app_data::<web::Data<Arc<dyn TokenService>>>()
        .cloned();
    let state = req.app_data::<web::Data<AppState>>().cloned();

    Box::pin(async move {
        let (Some(token_service), Some(state)) = (token_service, state) else {
            tracing::error!("TokenService or AppState not found in app data");
            return Err(AppError::Internal("Server configuration error".to_string()));
        };

        let session = match token.and_then(|token| token_service.open(&token)) {
            Ok(session) => session,
            Err(cause) => return Ok(Resolved::Anonymous(cause)),
        };

        Ok(match state.users.find_by_id(session.user_id).await? {
            Some(user) => Resolved::User(user),
            None => Resolved::Anonymous(AuthError::Rejected(format!(
                "user {} no longer exists",
                session.user_id
            ))),
        })
    })
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let next = req.uri().path().to_string();
        let resolved = resolve(req);

        Box::pin(async move {
            match resolved.await? {
                Resolved::User(user) => Ok(Identity { user }),
                Resolved::Anonymous(cause) => Err(AuthenticationError { cause, next }.into()),
            }
        })
    }
}

/// Whoever issues the request. Only a missing or invalid session makes the
/// actor anonymous; store failures still surface as errors.
#[derive(Debug, Clone, Default)]
pub struct CurrentActor(pub Actor);

impl FromRequest for CurrentActor {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let resolved = resolve(req);

        Box::pin(async move {
            match resolved.await? {
                Resolved::User(user) => Ok(CurrentActor(Actor::user(user.id, user.username))),
                Resolved::Anonymous(_) => Ok(CurrentActor(Actor::Anonymous)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_prefers_header() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer from-header"))
            .cookie(actix_web::cookie::Cookie::new(TOKEN_COOKIE, "from-cookie"))
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "from-header");

        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new(TOKEN_COOKIE, "from-cookie"))
            .to_http_request();
        assert_eq!(bearer_token(&req).unwrap(), "from-cookie");
    }

    #[test]
    fn test_bearer_token_errors() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(bearer_token(&req), Err(AuthError::NoCredentials)));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic abc"))
            .to_http_request();
        assert!(matches!(bearer_token(&req), Err(AuthError::Malformed(_))));
    }

    #[test]
    fn test_authentication_error_redirects_to_login() {
        let err = AuthenticationError {
            cause: AuthError::NoCredentials,
            next: "/posts/create".to_string(),
        };
        let response = err.error_response();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/posts/create"
        );
    }
}
