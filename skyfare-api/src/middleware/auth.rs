use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    /// The authenticated user's id. Every token we issue carries a UUID
    /// subject; anything else came from somewhere untrusted.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn is_admin(&self) -> bool {
        self.role == "ADMIN"
    }
}

/// The claims' subject as a user id, or a 401 for tokens whose subject is
/// not one of ours.
pub fn require_user_id(claims: &Claims) -> Result<Uuid, AppError> {
    claims
        .user_id()
        .ok_or_else(|| AppError::AuthenticationError("Invalid token subject".to_string()))
}

// ============================================================================
// Customer Authentication Middleware
// ============================================================================

/// Admits any authenticated account. Administrators pass too, so an admin
/// can exercise the customer surface without a second login.
pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract and validate the bearer token
    let claims = decode_claims(req.headers(), &state.auth.secret)?;

    // 2. Check role is CUSTOMER or ADMIN
    if claims.role != "CUSTOMER" && claims.role != "ADMIN" {
        return Err(StatusCode::FORBIDDEN);
    }

    // 3. Inject claims into request extensions
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract and validate the bearer token
    let claims = decode_claims(req.headers(), &state.auth.secret)?;

    // 2. Check role is ADMIN
    if claims.role != "ADMIN" {
        return Err(StatusCode::FORBIDDEN);
    }

    // 3. Inject claims
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Pulls the token out of `Authorization: Bearer <jwt>` and verifies
/// signature and expiry.
fn decode_claims(headers: &HeaderMap, secret: &str) -> Result<Claims, StatusCode> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(token_data.claims)
}
