//! Request ID middleware - tags every request with a correlation id.

use std::future::{Ready, ready};
use std::rc::Rc;

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderName, HeaderValue},
};
use futures::future::LocalBoxFuture;
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_INCOMING_ID_LENGTH: usize = 64;

/// Correlation id of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Reuse a well-formed id from upstream, otherwise mint a fresh one.
    fn from_incoming(value: Option<&str>) -> Self {
        let id = value
            .filter(|v| !v.is_empty() && v.len() <= MAX_INCOMING_ID_LENGTH)
            .filter(|v| v.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Middleware that propagates `X-Request-ID` or generates one, records it on
/// a tracing span and echoes it on the response.
pub struct RequestIdMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestIdService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestIdService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestIdService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_id = RequestId::from_incoming(
            req.headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
        );
        req.extensions_mut().insert(request_id.clone());

        let span = tracing::info_span!(
            "request",
            request_id = %request_id.as_str(),
            method = %req.method(),
            path = %req.path(),
        );
        let service = Rc::clone(&self.service);

        Box::pin(
            async move {
                let mut res = service.call(req).await?;

                if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
                    res.headers_mut()
                        .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                }

                Ok(res)
            }
            .instrument(span),
        )
    }
}

impl actix_web::FromRequest for RequestId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| RequestId::from_incoming(None));

        ready(Ok(request_id))
    }
}
