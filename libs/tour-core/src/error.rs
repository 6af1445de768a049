use http::StatusCode;
use serde::{Serialize, Serializer};

/// Coarse classification sent to clients alongside every error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The client sent something we refuse (4xx).
    Fail,
    /// Anything else, server faults included.
    Error,
}

impl Status {
    pub fn for_code(status_code: StatusCode) -> Self {
        if status_code.is_client_error() {
            Status::Fail
        } else {
            Status::Error
        }
    }
}

/// An expected, handled error whose message is safe to hand back to the caller.
///
/// Values are immutable once built; normalization produces new values instead
/// of patching existing ones.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    message: String,
    #[serde(serialize_with = "serialize_status_code")]
    status_code: StatusCode,
    status: Status,
    is_operational: bool,
}

impl AppError {
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            status_code,
            status: Status::for_code(status_code),
            is_operational: true,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_operational(&self) -> bool {
        self.is_operational
    }
}

pub(crate) fn serialize_status_code<S: Serializer>(
    code: &StatusCode,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u16(code.as_u16())
}
