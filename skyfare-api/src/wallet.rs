use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use skyfare_domain::Wallet;

use crate::{
    error::AppError,
    middleware::auth::{require_user_id, Claims},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct TopUpRequest {
    amount: Decimal,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/wallet", get(get_wallet))
        .route("/v1/wallet/topup", post(top_up))
}

async fn get_wallet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Wallet>, AppError> {
    let requester = require_user_id(&claims)?;
    let wallet = state.wallets.wallet_for_user(requester).await?;
    Ok(Json(wallet))
}

async fn top_up(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<TopUpRequest>,
) -> Result<Json<Wallet>, AppError> {
    let requester = require_user_id(&claims)?;
    let wallet = state.wallets.top_up(requester, req.amount).await?;
    Ok(Json(wallet))
}
