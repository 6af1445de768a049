//! Global error handling.
//!
//! Handlers never build error responses themselves. They return `ApiError`,
//! which parks the `Failure` in the response extensions; `handle_errors`
//! (the outermost application middleware) picks it up, normalizes it and
//! renders the single error response for the request.

pub mod normalize;
pub mod respond;

use std::any::Any;

use axum::{
    extract::{
        Request, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Method, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use tour_core::{AppError, Failure};
use tracing::debug;

use crate::AppState;

pub use respond::ErrorResponder;

/// Error type returned by every handler and middleware in this crate.
#[derive(Debug, Clone)]
pub struct ApiError(pub Failure);

impl From<Failure> for ApiError {
    fn from(failure: Failure) -> Self {
        ApiError(failure)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(Failure::App(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::new(rejection.body_text(), rejection.status()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::new(rejection.body_text(), rejection.status()).into()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        AppError::new(rejection.body_text(), rejection.status()).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(self.0);
        response
    }
}

/// Middleware that turns a parked `Failure` into the final response.
pub async fn handle_errors(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    match response.extensions_mut().remove::<Failure>() {
        Some(failure) => {
            debug!("rendering {} for failed request", failure.name());
            state.errors.respond(&failure)
        }
        None => response,
    }
}

/// Converts a handler panic into an unexpected failure for `handle_errors`.
pub fn panic_to_failure(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError(Failure::unexpected(message)).into_response()
}

/// Fallback for requests that match no route.
pub async fn route_not_found(uri: Uri) -> ApiError {
    AppError::not_found(format!("Can't find {} on this server!", uri.path())).into()
}

/// Fallback for a known path requested with a method it does not serve.
pub async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    AppError::new(
        format!("Method {} is not allowed on {}", method, uri.path()),
        StatusCode::METHOD_NOT_ALLOWED,
    )
    .into()
}
