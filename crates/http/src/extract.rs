//! Request extractors that report failures through [`AppError`].

use std::str::FromStr;

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// JSON request body; malformed payloads become a `bad_request` error body
/// instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

/// Path parameters; undecodable segments become a `bad_request` error body
/// instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParams<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParams<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
        }
    }
}

/// Parse a raw path segment as a number, naming the parameter on failure.
pub fn path_number<T: FromStr>(name: &str, raw: &str) -> Result<T, AppError> {
    raw.parse().map_err(|_| {
        AppError::bad_request(format!(
            "path parameter '{}' must be an integer, got '{}'",
            name, raw
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        title: String,
    }

    fn json_request(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[test]
    fn path_number_accepts_integers() {
        assert_eq!(path_number::<i64>("id", "42").unwrap(), 42);
        assert_eq!(path_number::<i32>("quantity", "-3").unwrap(), -3);
    }

    #[test]
    fn path_number_rejects_text() {
        let err = path_number::<i64>("id", "abc").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("'id'"));
    }

    #[tokio::test]
    async fn json_body_parses_payload() {
        let request = json_request(r#"{"title":"X"}"#);
        let JsonBody(payload) = JsonBody::<Payload>::from_request(request, &())
            .await
            .unwrap();
        assert_eq!(payload.title, "X");
    }

    async fn get_status_and_body(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        use tower::ServiceExt;

        let request = axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn path_params_decode_segments() {
        let app = axum::Router::new().route(
            "/books/buy/{id}/{quantity}",
            axum::routing::get(|PathParams((id, quantity)): PathParams<(String, String)>| async move {
                axum::Json(serde_json::json!([id, quantity]))
            }),
        );

        let (status, body) = get_status_and_body(app, "/books/buy/7/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!(["7", "3"]));
    }

    #[tokio::test]
    async fn path_params_reject_invalid_utf8_as_json_error() {
        let app = axum::Router::new().route(
            "/books/find/{name}",
            axum::routing::get(|PathParams(name): PathParams<String>| async move { name }),
        );

        let (status, body) = get_status_and_body(app, "/books/find/%FF").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");
        assert!(body["error"]["message"].as_str().unwrap().contains("UTF-8"));
    }

    #[tokio::test]
    async fn json_body_rejects_malformed_payload() {
        let err = JsonBody::<Payload>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
