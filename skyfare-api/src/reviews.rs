use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use tracing::info;
use uuid::Uuid;

use skyfare_domain::{Review, ReviewSpec};
use skyfare_store::{LedgerStore, LedgerTx};

use crate::{
    error::AppError,
    middleware::auth::{require_user_id, Claims},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/flights/{id}/reviews", get(flight_reviews).post(post_review))
}

async fn flight_reviews(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, AppError> {
    // Departed flights keep their reviews readable.
    state.directory.flight_record(flight_id).await?;
    Ok(Json(state.ledger.reviews_for_flight(flight_id).await?))
}

async fn post_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(flight_id): Path<Uuid>,
    Json(spec): Json<ReviewSpec>,
) -> Result<Json<Review>, AppError> {
    // 1. Customers only; admin tokens pass the middleware but cannot review
    if claims.role != "CUSTOMER" {
        return Err(AppError::AuthorizationError(
            "Only customers can post reviews".to_string(),
        ));
    }
    let requester = require_user_id(&claims)?;

    // 2. Validate the rating and text bounds
    spec.validate()?;

    // 3. The flight must exist, and the requester must have booked it
    state.directory.flight_record(flight_id).await?;
    if !state.ledger.user_has_booked_flight(requester, flight_id).await? {
        return Err(AppError::AuthorizationError(
            "Reviews require a booking on this flight".to_string(),
        ));
    }

    let review = Review::new(requester, flight_id, spec.rating, spec.text);
    let mut tx = state.ledger.begin().await?;
    tx.insert_review(&review).await?;
    tx.commit().await?;

    info!("user {} reviewed flight {}", requester, flight_id);
    Ok(Json(review))
}
