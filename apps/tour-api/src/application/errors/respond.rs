use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;
use tour_core::{Failure, Status};
use tracing::error;

use super::normalize::normalize;
use crate::config::Environment;

pub const GENERIC_MESSAGE: &str = "Something went wrong.";

/// JSON payload of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'a Failure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// A failure after normalization, with status code and status always filled in.
struct Resolved {
    status_code: StatusCode,
    status: Status,
    message: String,
    operational: bool,
}

impl Resolved {
    fn from_failure(failure: &Failure) -> Self {
        if let Some(err) = normalize(failure) {
            return Resolved {
                status_code: err.status_code(),
                status: err.status(),
                message: err.message().to_string(),
                operational: err.is_operational(),
            };
        }
        let status_code = match failure {
            Failure::Unexpected {
                status_code: Some(code),
                ..
            } => *code,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Resolved {
            status_code,
            status: Status::for_code(status_code),
            message: failure.to_string(),
            operational: false,
        }
    }
}

/// Renders failures for the deployment mode it was built with.
#[derive(Debug, Clone, Copy)]
pub struct ErrorResponder {
    environment: Environment,
}

impl ErrorResponder {
    pub fn new(environment: Environment) -> Self {
        Self { environment }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn render<'a>(&self, failure: &'a Failure) -> (StatusCode, ErrorBody<'a>) {
        let resolved = Resolved::from_failure(failure);
        match self.environment {
            Environment::Development => render_diagnostic(resolved, failure),
            Environment::Production => render_user_safe(resolved, failure),
        }
    }

    pub fn respond(&self, failure: &Failure) -> Response {
        let (status_code, body) = self.render(failure);
        (status_code, Json(body)).into_response()
    }
}

fn render_diagnostic(resolved: Resolved, failure: &Failure) -> (StatusCode, ErrorBody<'_>) {
    (
        resolved.status_code,
        ErrorBody {
            status: resolved.status,
            message: resolved.message,
            error: Some(failure),
            stack: Some(failure.trace()),
        },
    )
}

fn render_user_safe(resolved: Resolved, failure: &Failure) -> (StatusCode, ErrorBody<'_>) {
    if resolved.operational {
        return (
            resolved.status_code,
            ErrorBody {
                status: resolved.status,
                message: resolved.message,
                error: None,
                stack: None,
            },
        );
    }

    error!("Unhandled failure: {:?}", failure);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody {
            status: Status::Error,
            message: GENERIC_MESSAGE.to_string(),
            error: None,
            stack: None,
        },
    )
}
