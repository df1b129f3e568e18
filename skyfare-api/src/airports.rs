use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use skyfare_domain::{Airport, AirportSpec};

use crate::{error::AppError, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/airports", get(list_airports))
        .route("/v1/airports/{id}", get(get_airport))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/airports", post(create_airport))
        .route("/v1/airports/{id}", put(update_airport).delete(delete_airport))
}

async fn list_airports(State(state): State<AppState>) -> Result<Json<Vec<Airport>>, AppError> {
    Ok(Json(state.directory.airports().await?))
}

async fn get_airport(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Airport>, AppError> {
    Ok(Json(state.directory.airport(id).await?))
}

async fn create_airport(
    State(state): State<AppState>,
    Json(spec): Json<AirportSpec>,
) -> Result<Json<Airport>, AppError> {
    Ok(Json(state.directory.add_airport(spec).await?))
}

async fn update_airport(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(spec): Json<AirportSpec>,
) -> Result<Json<Airport>, AppError> {
    Ok(Json(state.directory.update_airport(id, spec).await?))
}

async fn delete_airport(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.directory.remove_airport(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
