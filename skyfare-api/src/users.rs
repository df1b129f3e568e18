use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use skyfare_domain::User;
use skyfare_shared::Masked;
use skyfare_store::{LedgerStore, LedgerTx};

use crate::{
    auth::hash_password,
    error::AppError,
    middleware::auth::{require_user_id, Claims},
    state::AppState,
};

#[derive(Debug, Deserialize)]
struct UpdateUserRequest {
    name: Option<String>,
    gender: Option<String>,
    password: Option<Masked<String>>,
}

pub fn customer_routes() -> Router<AppState> {
    Router::new().route(
        "/v1/users/{id}",
        get(get_user).put(update_user).delete(delete_user),
    )
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/v1/users", get(list_users))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.ledger.users().await?))
}

async fn get_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let requester = require_user_id(&claims)?;
    if id != requester && !claims.is_admin() {
        return Err(AppError::AuthorizationError(
            "Cannot read another user's profile".to_string(),
        ));
    }

    let user = state
        .ledger
        .user(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("user not found".to_string()))?;
    Ok(Json(user))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    // 1. Profiles are self-service only
    let requester = require_user_id(&claims)?;
    if id != requester {
        return Err(AppError::AuthorizationError(
            "Cannot update another user's profile".to_string(),
        ));
    }

    let mut user = state
        .ledger
        .user(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("user not found".to_string()))?;

    // 2. Apply the changed fields
    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(AppError::ValidationError("name must not be blank".to_string()));
        }
        user.name = name.trim().to_string();
    }
    if let Some(gender) = req.gender {
        if gender.trim().is_empty() {
            return Err(AppError::ValidationError("gender must not be blank".to_string()));
        }
        user.gender = gender;
    }
    if let Some(password) = req.password {
        if password.expose().len() < 8 {
            return Err(AppError::ValidationError(
                "password must be at least 8 characters".to_string(),
            ));
        }
        user.password_hash = hash_password(password.expose())?;
    }

    // 3. Persist
    let mut tx = state.ledger.begin().await?;
    tx.update_user(&user).await?;
    tx.commit().await?;

    info!("user {} updated their profile", user.id);
    Ok(Json(user))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let requester = require_user_id(&claims)?;
    if id != requester {
        return Err(AppError::AuthorizationError(
            "Cannot delete another user's account".to_string(),
        ));
    }

    // Removes the wallet, bookings, and reviews with the account.
    let mut tx = state.ledger.begin().await?;
    let deleted = tx.delete_user(id).await?;
    if !deleted {
        return Err(AppError::NotFoundError("user not found".to_string()));
    }
    tx.commit().await?;

    info!("user {} deleted their account", id);
    Ok(StatusCode::NO_CONTENT)
}
