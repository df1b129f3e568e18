use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod airplanes;
pub mod airports;
pub mod auth;
pub mod bookings;
pub mod error;
pub mod flights;
pub mod middleware;
pub mod reviews;
pub mod state;
pub mod users;
pub mod wallet;

pub use state::AppState;

use crate::middleware::{admin_auth_middleware, customer_auth_middleware};

/// Assembles the full route tree. Public routes (health, register, login)
/// carry no auth; the customer surface admits any valid token; the admin
/// surface admits ADMIN tokens only. A path may appear in both surfaces
/// with different methods, each keeping its own middleware.
pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let customer_surface = Router::new()
        .merge(bookings::customer_routes())
        .merge(wallet::routes())
        .merge(users::customer_routes())
        .merge(flights::read_routes())
        .merge(airports::read_routes())
        .merge(airplanes::read_routes())
        .merge(reviews::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            customer_auth_middleware,
        ));

    let admin_surface = Router::new()
        .merge(bookings::admin_routes())
        .merge(users::admin_routes())
        .merge(flights::admin_routes())
        .merge(airports::admin_routes())
        .merge(airplanes::admin_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(auth::routes())
        .merge(customer_surface)
        .merge(admin_surface)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
