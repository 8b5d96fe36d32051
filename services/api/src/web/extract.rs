//! services/api/src/web/extract.rs
//!
//! Thin wrappers over axum's extractors that report rejections as `ApiError`,
//! so malformed input gets the same JSON error body as every other failure.

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Path parameters. A segment that does not parse is a 400.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string. Unparseable values are a 422.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// JSON request body. A missing or malformed body is a 422.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Input read from the query string when one is present, otherwise from a
/// JSON body. Either way a malformed payload is a 422.
pub struct QueryOrJson<T>(pub T);

impl<S, T> FromRequest<S> for QueryOrJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if req.uri().query().is_some_and(|query| !query.is_empty()) {
            let Query(value) = Query::<T>::try_from_uri(req.uri())?;
            return Ok(Self(value));
        }
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
