use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use skyfare_booking::BookingError;
use skyfare_directory::DirectoryError;
use skyfare_domain::DomainError;
use skyfare_store::StoreError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InsufficientFundsError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InsufficientFundsError(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::ValidationError(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::ConflictError(msg),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::NotFound(entity) => {
                AppError::NotFoundError(format!("{} not found", entity))
            }
            BookingError::InsufficientFunds {
                required,
                available,
            } => AppError::InsufficientFundsError(format!(
                "Insufficient funds: required {}, available {}",
                required, available
            )),
            // Integrity fault: every registered user has a wallet, so this
            // is server-side damage rather than a caller mistake.
            BookingError::MissingWallet(user_id) => {
                AppError::InternalServerError(format!("Wallet record missing for user {}", user_id))
            }
            BookingError::Store(err) => err.into(),
        }
    }
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Validation(msg) => AppError::ValidationError(msg),
            DirectoryError::NotFound(entity) => {
                AppError::NotFoundError(format!("{} not found", entity))
            }
            DirectoryError::Conflict(msg) => AppError::ConflictError(msg),
            DirectoryError::FlightDeparted(id) => {
                AppError::ValidationError(format!("Flight {} has already departed", id))
            }
            DirectoryError::Store(err) => AppError::InternalServerError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_booking_errors_map_to_statuses() {
        let cases = [
            (
                AppError::from(BookingError::Validation("bad manifest".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(BookingError::NotFound("booking")),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(BookingError::InsufficientFunds {
                    required: Decimal::new(30000, 2),
                    available: Decimal::new(5000, 2),
                }),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                AppError::from(BookingError::MissingWallet(Uuid::new_v4())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::from(BookingError::Store(StoreError::Conflict(
                    "duplicate email".into(),
                ))),
                StatusCode::CONFLICT,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_departed_flight_maps_to_bad_request() {
        let err = AppError::from(DirectoryError::FlightDeparted(Uuid::new_v4()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_hides_details() {
        let response =
            AppError::InternalServerError("wallet row vanished".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
