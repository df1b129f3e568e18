use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use skyfare_domain::{Airplane, AirplaneSpec};

use crate::{error::AppError, state::AppState};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/airplanes", get(list_airplanes))
        .route("/v1/airplanes/{id}", get(get_airplane))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/airplanes", post(create_airplane))
        .route("/v1/airplanes/{id}", put(update_airplane).delete(delete_airplane))
}

async fn list_airplanes(State(state): State<AppState>) -> Result<Json<Vec<Airplane>>, AppError> {
    Ok(Json(state.directory.airplanes().await?))
}

async fn get_airplane(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Airplane>, AppError> {
    Ok(Json(state.directory.airplane(id).await?))
}

async fn create_airplane(
    State(state): State<AppState>,
    Json(spec): Json<AirplaneSpec>,
) -> Result<Json<Airplane>, AppError> {
    Ok(Json(state.directory.add_airplane(spec).await?))
}

async fn update_airplane(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(spec): Json<AirplaneSpec>,
) -> Result<Json<Airplane>, AppError> {
    Ok(Json(state.directory.update_airplane(id, spec).await?))
}

async fn delete_airplane(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.directory.remove_airplane(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
