use axum::{extract::Request, middleware::Next, response::Response};
use chrono::{DateTime, Utc};

/// Moment the request entered the application.
#[derive(Debug, Clone, Copy)]
pub struct RequestTime(pub DateTime<Utc>);

pub async fn stamp_request_time(mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(RequestTime(Utc::now()));
    next.run(req).await
}
