use http::StatusCode;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::AppError;

/// Error code the document store reports for unique index violations.
pub const DUPLICATE_KEY_CODE: u32 = 11000;

/// A single rule violation on one field of a submitted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub kind: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: &str, kind: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

/// Every way a request can go wrong, classified where the failure is raised.
///
/// Serialized with a `name` tag so diagnostic responses show the raw shape.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name")]
pub enum Failure {
    /// A request value could not be converted into the type a field requires.
    #[error("Cast to {kind} failed for value \"{value}\" at path \"{path}\"")]
    #[serde(rename = "CastError")]
    Cast {
        path: String,
        value: String,
        kind: String,
    },

    /// A unique index rejected the write.
    #[error("E11000 duplicate key error dup key: {{ {} }}", render_key_value(.key_value))]
    #[serde(rename = "MongoServerError")]
    DuplicateKey {
        code: u32,
        #[serde(rename = "keyValue")]
        key_value: IndexMap<String, Value>,
    },

    /// One or more document rules were violated.
    #[error("Validation failed: {}", render_field_errors(.errors))]
    #[serde(rename = "ValidationError")]
    Validation { errors: IndexMap<String, FieldError> },

    /// A bearer token that is malformed or signed with the wrong key.
    #[error("{message}")]
    #[serde(rename = "JsonWebTokenError")]
    InvalidToken { message: String },

    /// A well-formed bearer token past its expiry.
    #[error("{message}")]
    #[serde(rename = "TokenExpiredError")]
    TokenExpired {
        message: String,
        #[serde(rename = "expiredAt", skip_serializing_if = "Option::is_none")]
        expired_at: Option<i64>,
    },

    /// Raised deliberately by application code.
    #[error(transparent)]
    #[serde(rename = "AppError")]
    App(AppError),

    /// Anything nobody planned for.
    #[error("{message}")]
    #[serde(rename = "Error")]
    Unexpected {
        message: String,
        #[serde(
            rename = "statusCode",
            skip_serializing_if = "Option::is_none",
            serialize_with = "serialize_optional_code"
        )]
        status_code: Option<StatusCode>,
    },
}

impl Failure {
    pub fn cast(path: &str, value: impl Into<String>, kind: &str) -> Self {
        Failure::Cast {
            path: path.to_string(),
            value: value.into(),
            kind: kind.to_string(),
        }
    }

    pub fn duplicate_key(field: &str, value: impl Into<Value>) -> Self {
        let mut key_value = IndexMap::new();
        key_value.insert(field.to_string(), value.into());
        Failure::DuplicateKey {
            code: DUPLICATE_KEY_CODE,
            key_value,
        }
    }

    /// Returns `None` when there is nothing to report.
    pub fn validation(errors: Vec<FieldError>) -> Option<Self> {
        if errors.is_empty() {
            return None;
        }
        let errors = errors
            .into_iter()
            .map(|err| (err.path.clone(), err))
            .collect();
        Some(Failure::Validation { errors })
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Failure::Unexpected {
            message: message.into(),
            status_code: None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Failure::Cast { .. } => "CastError",
            Failure::DuplicateKey { .. } => "MongoServerError",
            Failure::Validation { .. } => "ValidationError",
            Failure::InvalidToken { .. } => "JsonWebTokenError",
            Failure::TokenExpired { .. } => "TokenExpiredError",
            Failure::App(_) => "AppError",
            Failure::Unexpected { .. } => "Error",
        }
    }

    /// Diagnostic trace: the failure name and message followed by its causes.
    pub fn trace(&self) -> String {
        let mut trace = format!("{}: {}", self.name(), self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            trace.push_str("\n    caused by: ");
            trace.push_str(&cause.to_string());
            source = cause.source();
        }
        trace
    }
}

impl From<AppError> for Failure {
    fn from(err: AppError) -> Self {
        Failure::App(err)
    }
}

/// Renders a JSON value the way it reads in a message: strings without quotes.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_key_value(key_value: &IndexMap<String, Value>) -> String {
    key_value
        .iter()
        .map(|(field, value)| format!("{field}: {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_field_errors(errors: &IndexMap<String, FieldError>) -> String {
    errors
        .iter()
        .map(|(path, err)| format!("{path}: {}", err.message))
        .collect::<Vec<_>>()
        .join(", ")
}

fn serialize_optional_code<S: serde::Serializer>(
    code: &Option<StatusCode>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match code {
        Some(code) => crate::error::serialize_status_code(code, serializer),
        None => serializer.serialize_none(),
    }
}
