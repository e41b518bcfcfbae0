//! Caller identity taken from the `X-User-ID` header.
//!
//! There is no authentication: the header is an opaque shopper id. When it
//! is missing or malformed a fresh id is issued and echoed back so the
//! client can keep using the same cart.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, HeaderName, HeaderValue, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use uuid::Uuid;

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("x-user-id");

/// Resolved shopper id for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId {
    pub id: Uuid,
    /// True when the id was generated for this request rather than supplied
    pub issued: bool,
}

impl UserId {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let supplied = headers
            .get(&USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

        match supplied {
            Some(id) => Self { id, issued: false },
            None => Self {
                id: Uuid::now_v7(),
                issued: true,
            },
        }
    }
}

/// Middleware resolving [`UserId`] once per request and echoing newly
/// issued ids in the response `X-User-ID` header.
pub async fn ensure_user_id(mut request: Request, next: Next) -> Response {
    let user = UserId::from_headers(request.headers());
    if user.issued {
        tracing::debug!(user_id = %user.id, "Issued new user id");
    }
    request.extensions_mut().insert(user);

    let mut response = next.run(request).await;

    if user.issued {
        if let Ok(value) = HeaderValue::from_str(&user.id.to_string()) {
            response.headers_mut().insert(USER_ID_HEADER, value);
        }
    }

    response
}

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<UserId>() {
            return Ok(*user);
        }
        Ok(UserId::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request as HttpRequest, middleware, routing::get};
    use tower::ServiceExt;

    async fn whoami(user: UserId) -> String {
        user.id.to_string()
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(whoami))
            .layer(middleware::from_fn(ensure_user_id))
    }

    #[tokio::test]
    async fn test_supplied_id_is_used_and_not_echoed() {
        let id = Uuid::now_v7();
        let request = HttpRequest::builder()
            .uri("/")
            .header("X-User-ID", id.to_string())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert!(response.headers().get(&USER_ID_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_missing_id_is_issued_and_echoed() {
        let request = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();

        let response = app().oneshot(request).await.unwrap();

        let echoed = response.headers().get(&USER_ID_HEADER).unwrap();
        assert!(Uuid::parse_str(echoed.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_malformed_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("12345"));

        let user = UserId::from_headers(&headers);

        assert!(user.issued);
    }
}
