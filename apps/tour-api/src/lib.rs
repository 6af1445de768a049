use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tour_core::TourStore;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod application;
pub mod config;

use application::{
    errors::{
        ErrorResponder, handle_errors, method_not_allowed, panic_to_failure, route_not_found,
    },
    middleware::{
        RequestLimiter, limit_requests, require_token, security_headers, stamp_request_time,
    },
    tours::{create_tour, delete_tour, get_all_tours, get_tour, update_tour},
};
use config::Config;

// Holds shared dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TourStore>,
    pub errors: ErrorResponder,
    pub jwt_secret: Arc<str>,
    pub body_limit_bytes: usize,
    pub limiter: Arc<RequestLimiter>,
}

impl AppState {
    pub fn new(store: Arc<dyn TourStore>, config: &Config) -> Self {
        Self {
            store,
            errors: ErrorResponder::new(config.environment),
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            body_limit_bytes: config.body_limit_bytes,
            limiter: Arc::new(RequestLimiter::new(
                config.rate_limit_max,
                config.rate_limit_window,
            )),
        }
    }
}

// Function to create the main Axum router with state
pub fn create_app(app_state: AppState) -> Router {
    let auth = middleware::from_fn_with_state(app_state.clone(), require_token);

    let api_routes = Router::new()
        .route(
            "/api/v1/tours",
            get(get_all_tours).merge(post(create_tour).route_layer(auth.clone())),
        )
        .route(
            "/api/v1/tours/{id}",
            get(get_tour).merge(
                patch(update_tour)
                    .merge(delete(delete_tour))
                    .route_layer(auth),
            ),
        )
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Layers run outside-in from the bottom: headers and CORS wrap the error
    // pipeline so they also decorate rendered errors.
    let app = api_routes
        .layer(middleware::from_fn(stamp_request_time))
        .layer(DefaultBodyLimit::max(app_state.body_limit_bytes))
        .layer(CatchPanicLayer::custom(panic_to_failure))
        .layer(middleware::from_fn_with_state(app_state.clone(), limit_requests))
        .layer(middleware::from_fn_with_state(app_state.clone(), handle_errors))
        .layer(middleware::from_fn(security_headers))
        .layer(cors);

    let app = if app_state.errors.environment().is_development() {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    };

    app.with_state(app_state)
}
