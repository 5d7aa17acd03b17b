//! Request extractors that reject with the JSON error envelope
//!
//! Axum's own `Path`, `Query` and `Json` answer malformed input with a plain
//! text body. These wrappers run the same extraction and turn the rejection
//! into an `ApiError` with the `VALIDATION_ERROR` code.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use crate::api::middleware::ApiError;

/// `Path` extractor with envelope rejections
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(path_rejection(rejection)),
        }
    }
}

/// `Query` extractor with envelope rejections
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

/// `Json` body extractor with envelope rejections
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn path_rejection(rejection: PathRejection) -> ApiError {
    tracing::debug!("Rejected path parameters: {}", rejection);
    ApiError::validation_error(rejection.body_text())
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    tracing::debug!("Rejected query string: {}", rejection);
    ApiError::validation_error(rejection.body_text())
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!("Rejected JSON body: {}", rejection);
    ApiError::validation_error(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Order {
        order: i32,
    }

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("PUT")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_body_is_extracted() {
        let ApiJson(order) = ApiJson::<Order>::from_request(json_request(r#"{"order":3}"#), &())
            .await
            .unwrap();
        assert_eq!(order.order, 3);
    }

    #[tokio::test]
    async fn test_mistyped_json_becomes_validation_error() {
        let err = ApiJson::<Order>::from_request(json_request(r#"{"order":"2"}"#), &())
            .await
            .unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(!err.error.is_empty());
    }

    #[tokio::test]
    async fn test_missing_content_type_becomes_validation_error() {
        let req = Request::builder()
            .method("PUT")
            .uri("/")
            .body(Body::from(r#"{"order":3}"#))
            .unwrap();
        let err = ApiJson::<Order>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_bad_query_becomes_validation_error() {
        #[derive(Debug, Deserialize)]
        struct Page {
            #[allow(dead_code)]
            page: u32,
        }

        let (mut parts, _) = Request::builder()
            .uri("/?page=first")
            .body(Body::empty())
            .unwrap()
            .into_parts();
        let err = ApiQuery::<Page>::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.code, "VALIDATION_ERROR");
    }
}
