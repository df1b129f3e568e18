use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skyfare_domain::{Booking, BookingRequest};

use crate::{
    error::AppError,
    middleware::auth::{require_user_id, Claims},
    state::AppState,
};

#[derive(Debug, Serialize)]
struct BookingResponse {
    booking_id: Uuid,
    customer_id: Uuid,
    flight_id: Uuid,
    booking_time: DateTime<Utc>,
    total_amount: Decimal,
    passengers: Vec<PassengerView>,
}

#[derive(Debug, Serialize)]
struct PassengerView {
    name: String,
    age: i32,
    gender: String,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_id: booking.id,
            customer_id: booking.user_id,
            flight_id: booking.flight_id,
            booking_time: booking.booking_time,
            total_amount: booking.total_amount,
            passengers: booking
                .tickets
                .into_iter()
                .map(|t| PassengerView {
                    name: t.passenger_name,
                    age: t.passenger_age,
                    gender: t.passenger_gender,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CancellationResponse {
    booking_id: Uuid,
    refunded: Decimal,
}

#[derive(Debug, Deserialize)]
struct BookingListParams {
    customer_id: Option<Uuid>,
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking).delete(cancel_booking))
        .route("/v1/users/{id}/bookings", get(user_bookings))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/v1/bookings", get(list_bookings))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let requester = require_user_id(&claims)?;
    let booking = state.engine.book_flight(requester, req).await?;
    Ok(Json(BookingResponse::from(booking)))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let requester = require_user_id(&claims)?;
    let booking = state.engine.booking_by_id(id).await?;

    // Owner or admin only
    if booking.user_id != requester && !claims.is_admin() {
        return Err(AppError::AuthorizationError(
            "Booking belongs to another customer".to_string(),
        ));
    }

    Ok(Json(BookingResponse::from(booking)))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<CancellationResponse>, AppError> {
    let requester = require_user_id(&claims)?;
    let booking = state.engine.booking_by_id(id).await?;

    if booking.user_id != requester && !claims.is_admin() {
        return Err(AppError::AuthorizationError(
            "Booking belongs to another customer".to_string(),
        ));
    }

    let refunded = state.engine.cancel_booking(id).await?;
    Ok(Json(CancellationResponse {
        booking_id: id,
        refunded,
    }))
}

async fn user_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let requester = require_user_id(&claims)?;
    if user_id != requester && !claims.is_admin() {
        return Err(AppError::AuthorizationError(
            "Cannot read another customer's bookings".to_string(),
        ));
    }

    let bookings = state.engine.bookings_for_user(user_id).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<BookingListParams>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state.engine.all_bookings(params.customer_id).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}
