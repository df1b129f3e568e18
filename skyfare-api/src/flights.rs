use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use skyfare_domain::{Flight, FlightSpec};

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
struct FlightSearchParams {
    from: Uuid,
    to: Uuid,
    date: Option<NaiveDate>,
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", get(list_flights))
        .route("/v1/flights/search", get(search_flights))
        .route("/v1/flights/{id}", get(get_flight))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/flights", post(create_flight))
        .route("/v1/flights/{id}", put(update_flight).delete(delete_flight))
}

async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<Flight>>, AppError> {
    Ok(Json(state.directory.upcoming_flights().await?))
}

async fn search_flights(
    State(state): State<AppState>,
    Query(params): Query<FlightSearchParams>,
) -> Result<Json<Vec<Flight>>, AppError> {
    let flights = state
        .directory
        .search(params.from, params.to, params.date)
        .await?;
    Ok(Json(flights))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.directory.flight(id).await?))
}

async fn create_flight(
    State(state): State<AppState>,
    Json(spec): Json<FlightSpec>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.directory.add_flight(spec).await?))
}

async fn update_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(spec): Json<FlightSpec>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(state.directory.update_flight(id, spec).await?))
}

async fn delete_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.directory.remove_flight(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AuthConfig;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use skyfare_domain::{AirplaneSpec, AirportSpec};
    use skyfare_store::MemoryStore;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let store = Arc::new(MemoryStore::new());
        AppState::new(
            store.clone(),
            store,
            AuthConfig {
                secret: "test-secret".into(),
                expiration_seconds: 18000,
            },
        )
    }

    async fn seed_route(state: &AppState) -> (Uuid, Uuid, Uuid) {
        let airplane = state
            .directory
            .add_airplane(AirplaneSpec {
                name: "City Hopper".into(),
                tail_number: "N100SF".into(),
                model: "A220-300".into(),
                manufacturer: "Airbus".into(),
                capacity: 140,
            })
            .await
            .unwrap();
        let from = state
            .directory
            .add_airport(AirportSpec {
                code: "AAA".into(),
                name: "Alpha International".into(),
                city: "Alpha".into(),
                state: "Alpha".into(),
                country: "Testland".into(),
            })
            .await
            .unwrap();
        let to = state
            .directory
            .add_airport(AirportSpec {
                code: "BBB".into(),
                name: "Beta International".into(),
                city: "Beta".into(),
                state: "Beta".into(),
                country: "Testland".into(),
            })
            .await
            .unwrap();
        (airplane.id, from.id, to.id)
    }

    fn spec(airplane: Uuid, from: Uuid, to: Uuid, hours_ahead: i64) -> FlightSpec {
        let departure = Utc::now() + Duration::hours(hours_ahead);
        FlightSpec {
            airline: "Skyfare Air".into(),
            airplane_id: airplane,
            from_airport_id: from,
            to_airport_id: to,
            departure_time: departure,
            arrival_time: departure + Duration::hours(2),
            price: Decimal::new(10000, 2),
        }
    }

    #[tokio::test]
    async fn test_admin_crud_and_listing() {
        let state = test_state();
        let (airplane, from, to) = seed_route(&state).await;

        let Json(created) = create_flight(State(state.clone()), Json(spec(airplane, from, to, 48)))
            .await
            .unwrap();

        let Json(listed) = list_flights(State(state.clone())).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);

        let mut cheaper = spec(airplane, from, to, 48);
        cheaper.price = Decimal::new(7500, 2);
        let Json(updated) = update_flight(State(state.clone()), Path(created.id), Json(cheaper))
            .await
            .unwrap();
        assert_eq!(updated.price, Decimal::new(7500, 2));

        let status = delete_flight(State(state.clone()), Path(created.id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_flight(State(state), Path(created.id)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFoundError(_)));
    }

    #[tokio::test]
    async fn test_departed_flight_read_is_rejected() {
        let state = test_state();
        let (airplane, from, to) = seed_route(&state).await;

        let Json(departed) = create_flight(State(state.clone()), Json(spec(airplane, from, to, -3)))
            .await
            .unwrap();

        // Hidden from the listing and rejected on direct read.
        let Json(listed) = list_flights(State(state.clone())).await.unwrap();
        assert!(listed.is_empty());

        let err = get_flight(State(state), Path(departed.id)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_search_filters_route_and_date() {
        let state = test_state();
        let (airplane, from, to) = seed_route(&state).await;

        let Json(target) = create_flight(State(state.clone()), Json(spec(airplane, from, to, 72)))
            .await
            .unwrap();
        create_flight(State(state.clone()), Json(spec(airplane, to, from, 72)))
            .await
            .unwrap();

        let Json(hits) = search_flights(
            State(state.clone()),
            Query(FlightSearchParams {
                from,
                to,
                date: Some(target.departure_time.date_naive()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, target.id);

        let Json(none) = search_flights(
            State(state),
            Query(FlightSearchParams {
                from,
                to,
                date: Some(target.departure_time.date_naive() + Duration::days(30)),
            }),
        )
        .await
        .unwrap();
        assert!(none.is_empty());
    }
}
