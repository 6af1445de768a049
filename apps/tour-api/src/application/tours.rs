use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tour_core::{
    AppError, Failure,
    domain::{
        query::{SortKey, TourQuery},
        tour::{Difficulty, TourDraft, TourId},
    },
    sanitize::strip_operator_keys,
};
use tracing::info;

use super::{
    errors::ApiError,
    middleware::{Claims, RequestTime},
};
use crate::AppState;

const NOT_FOUND_MESSAGE: &str = "No tour found with that ID";

/// Raw query string for listing; every value is checked before use.
#[derive(Debug, Default, Deserialize)]
pub struct TourListParams {
    pub duration: Option<String>,
    pub difficulty: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl TourListParams {
    pub fn into_query(self) -> Result<TourQuery, Failure> {
        let duration = self
            .duration
            .map(|raw| parse_number("duration", &raw))
            .transpose()?;
        let difficulty = self
            .difficulty
            .map(|raw| {
                raw.parse::<Difficulty>()
                    .map_err(|()| Failure::cast("difficulty", raw.as_str(), "Difficulty"))
            })
            .transpose()?;
        let sort = match self.sort {
            Some(raw) => SortKey::parse_list(&raw)?,
            None => Vec::new(),
        };
        let page = self.page.map(|raw| parse_number("page", &raw)).transpose()?;
        let limit = self.limit.map(|raw| parse_number("limit", &raw)).transpose()?;

        Ok(TourQuery {
            duration,
            difficulty,
            sort,
            ..TourQuery::default()
        }
        .with_window(page, limit))
    }
}

fn parse_number(path: &str, raw: &str) -> Result<u32, Failure> {
    raw.trim()
        .parse()
        .map_err(|_| Failure::cast(path, raw, "Number"))
}

/// Decodes a JSON body into a draft after stripping operator-like keys.
fn decode_draft(body: Value) -> Result<TourDraft, ApiError> {
    serde_json::from_value(strip_operator_keys(body))
        .map_err(|e| AppError::bad_request(format!("Invalid input data. {e}")).into())
}

fn not_found() -> ApiError {
    AppError::not_found(NOT_FOUND_MESSAGE).into()
}

// GET /api/v1/tours
pub async fn get_all_tours(
    State(app_state): State<AppState>,
    Extension(RequestTime(requested_at)): Extension<RequestTime>,
    params: Result<Query<TourListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params?;
    let query = params.into_query()?;
    let tours = app_state.store.find(&query).await?;

    Ok(Json(json!({
        "status": "success",
        "requestedAt": requested_at.to_rfc3339(),
        "results": tours.len(),
        "data": { "tours": tours }
    })))
}

// GET /api/v1/tours/{id}
pub async fn get_tour(
    State(app_state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let id = TourId::parse(&id)?;
    let tour = app_state.store.find_by_id(&id).await?.ok_or_else(not_found)?;

    Ok(Json(json!({
        "status": "success",
        "data": { "tour": tour }
    })))
}

// POST /api/v1/tours
pub async fn create_tour(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let new_tour = decode_draft(body)?.validate()?;
    let tour = app_state.store.create(new_tour).await?;
    info!("Tour {} created by {}", tour.id, claims.sub);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "data": { "tour": tour }
        })),
    ))
}

// PATCH /api/v1/tours/{id}
pub async fn update_tour(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let id = TourId::parse(&id)?;
    let Json(body) = body?;
    let patch = decode_draft(body)?;
    let tour = app_state.store.update(&id, patch).await?.ok_or_else(not_found)?;
    info!("Tour {} updated by {}", tour.id, claims.sub);

    Ok(Json(json!({
        "status": "success",
        "data": { "tour": tour }
    })))
}

// DELETE /api/v1/tours/{id}
pub async fn delete_tour(
    State(app_state): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    let id = TourId::parse(&id)?;
    let tour = app_state.store.delete(&id).await?.ok_or_else(not_found)?;
    info!("Tour {} deleted by {}", tour.id, claims.sub);

    Ok(StatusCode::NO_CONTENT)
}
