//! Authorization guards attached to individual routes.
//!
//! A route that needs a credential declares it at registration:
//!
//! ```ignore
//! Router::new().route("/authors/", get(list).route_layer(RequireBearerLayer::new(token)))
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    response::{IntoResponse, Response},
};
use library_http::AppError;
use tower::{Layer, Service};

/// Static bearer token shared by every guarded route.
#[derive(Clone)]
pub struct BearerToken(Arc<str>);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Arc::from(token.into()))
    }

    /// Check the `Authorization` header against the expected token.
    pub fn verify(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized("Token not found"))?;

        if presented == &*self.0 {
            Ok(())
        } else {
            Err(AppError::unauthorized("Token not valid"))
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Layer rejecting requests that lack the configured bearer token.
#[derive(Clone, Debug)]
pub struct RequireBearerLayer {
    token: BearerToken,
}

impl RequireBearerLayer {
    pub fn new(token: BearerToken) -> Self {
        Self { token }
    }
}

impl<S> Layer<S> for RequireBearerLayer {
    type Service = RequireBearer<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireBearer {
            inner,
            token: self.token.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RequireBearer<S> {
    inner: S,
    token: BearerToken,
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

impl<S> Service<Request> for RequireBearer<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        if let Err(err) = self.token.verify(request.headers()) {
            tracing::warn!(
                target: "library-authz",
                path = %request.uri().path(),
                "rejected request without valid bearer token"
            );
            let response = err.into_response();
            return Box::pin(async move { Ok(response) });
        }

        Box::pin(self.inner.call(request))
    }
}
