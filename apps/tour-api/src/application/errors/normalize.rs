use http::StatusCode;
use indexmap::IndexMap;
use serde_json::Value;
use tour_core::{AppError, FieldError, Failure, failure::display_value};

/// Translates a recognised failure into an operational `AppError`.
///
/// Returns `None` for failures nobody anticipated; the caller decides how
/// much of those to reveal. New failure kinds are supported by adding an arm
/// here, never by touching response rendering.
pub fn normalize(failure: &Failure) -> Option<AppError> {
    match failure {
        Failure::Cast { path, value, .. } => Some(cast_error(path, value)),
        Failure::DuplicateKey { key_value, .. } => Some(duplicate_field_error(key_value)),
        Failure::Validation { errors } => Some(validation_error(errors)),
        Failure::InvalidToken { .. } => Some(AppError::new(
            "Invalid token. Please log in again.",
            StatusCode::UNAUTHORIZED,
        )),
        Failure::TokenExpired { .. } => Some(AppError::new(
            "Your token has expired. Please log in again.",
            StatusCode::UNAUTHORIZED,
        )),
        Failure::App(err) => Some(err.clone()),
        Failure::Unexpected { .. } => None,
    }
}

fn cast_error(path: &str, value: &str) -> AppError {
    AppError::bad_request(format!("Invalid {path}: {value}"))
}

fn duplicate_field_error(key_value: &IndexMap<String, Value>) -> AppError {
    let message = match key_value.values().next() {
        Some(value) => format!(
            "Duplicate field value: \"{}\". Please use another value!",
            display_value(value)
        ),
        None => "Duplicate field value. Please use another value!".to_string(),
    };
    AppError::bad_request(message)
}

fn validation_error(errors: &IndexMap<String, FieldError>) -> AppError {
    let messages: Vec<&str> = errors.values().map(|e| e.message.as_str()).collect();
    AppError::bad_request(format!("Invalid input data. {}", messages.join(". ")))
}
