pub mod auth;
pub mod rate_limit;
pub mod request_time;
pub mod security_headers;

pub use auth::{Claims, require_token};
pub use rate_limit::{RequestLimiter, limit_requests};
pub use request_time::{RequestTime, stamp_request_time};
pub use security_headers::security_headers;
