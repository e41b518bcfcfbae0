//! JSON body and query extractors that run `validator` rules.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, FromRequestParts, Json, Query, Request},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::{ErrorCode, error_response};

/// JSON extractor with automatic validation.
///
/// Rejections are rendered through [`AppError`], so malformed bodies and
/// failed field rules share the standard error shape.
///
/// ```ignore
/// #[derive(Deserialize, Validate)]
/// struct AddCartItem {
///     product_id: Uuid,
///     #[validate(range(min = 1))]
///     quantity: i32,
/// }
///
/// async fn add_item(ValidatedJson(payload): ValidatedJson<AddCartItem>) { /* ... */ }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}

/// Query-string counterpart of [`ValidatedJson`].
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(data) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.body_text(), ErrorCode::ValidationError))?;

        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedQuery(data))
    }
}
