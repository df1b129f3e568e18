use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use skyfare_domain::{Role, User, Wallet};
use skyfare_shared::Masked;
use skyfare_store::{LedgerStore, LedgerTx};

use crate::{
    error::AppError,
    middleware::auth::Claims,
    state::{AppState, AuthConfig},
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: Masked<String>,
    gender: String,
    role: Option<Role>,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("name must not be blank".to_string()));
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::ValidationError("a valid email is required".to_string()));
        }
        if self.password.expose().len() < MIN_PASSWORD_LEN {
            return Err(AppError::ValidationError(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.gender.trim().is_empty() {
            return Err(AppError::ValidationError("gender must not be blank".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: Masked<String>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: User,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<User>, AppError> {
    // 1. Validate the profile fields
    req.validate()?;

    // 2. Refuse emails that are already taken
    if state.ledger.user_by_email(req.email.trim()).await?.is_some() {
        return Err(AppError::ConflictError("Email already registered".to_string()));
    }

    // 3. Hash the password; the plaintext never leaves the auth layer
    let password_hash = hash_password(req.password.expose())?;

    let user = User::new(
        req.name.trim().to_string(),
        req.email.trim().to_string(),
        password_hash,
        req.gender,
        req.role.unwrap_or(Role::CUSTOMER),
    );

    // 4. Create the user and their zero-balance wallet in one unit of work
    let mut tx = state.ledger.begin().await?;
    tx.insert_user(&user).await?;
    tx.save_wallet(&Wallet::new(user.id)).await?;
    tx.commit().await?;

    info!("registered user {} ({})", user.id, user.email);
    Ok(Json(user))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    // 1. Resolve the account; a wrong email reads the same as a wrong
    //    password from outside
    let user = state
        .ledger
        .user_by_email(req.email.trim())
        .await?
        .ok_or_else(|| AppError::AuthenticationError("Invalid email or password".to_string()))?;

    // 2. Verify against the stored argon2 hash
    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::InternalServerError(format!("Stored hash is unreadable: {}", e)))?;
    if Argon2::default()
        .verify_password(req.password.expose().as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::AuthenticationError("Invalid email or password".to_string()));
    }

    // 3. Issue the session token
    let token = issue_token(&user, &state.auth)?;
    info!("user {} logged in", user.id);

    Ok(Json(AuthResponse { token, user }))
}

pub(crate) fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))?
        .to_string())
}

fn issue_token(user: &User, auth: &AuthConfig) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.to_string(),
        exp: (Utc::now() + Duration::seconds(auth.expiration_seconds as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use rust_decimal::Decimal;
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

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada".into(),
            email: email.into(),
            password: Masked::new("correct-horse".into()),
            gender: "female".into(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_register_creates_user_and_zero_wallet() {
        let state = test_state();

        let Json(user) = register(State(state.clone()), Json(register_request("ada@example.com")))
            .await
            .unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::CUSTOMER);

        let wallet = state.ledger.wallet_for_user(user.id).await.unwrap().unwrap();
        assert_eq!(wallet.balance(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let state = test_state();
        register(State(state.clone()), Json(register_request("ada@example.com")))
            .await
            .unwrap();

        let err = register(State(state), Json(register_request("ada@example.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConflictError(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let state = test_state();
        let mut request = register_request("ada@example.com");
        request.password = Masked::new("short".into());

        let err = register(State(state), Json(request)).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_login_round_trips_a_verifiable_token() {
        let state = test_state();
        let Json(user) = register(State(state.clone()), Json(register_request("ada@example.com")))
            .await
            .unwrap();

        let Json(response) = login(
            State(state.clone()),
            Json(LoginRequest {
                email: "ada@example.com".into(),
                password: Masked::new("correct-horse".into()),
            }),
        )
        .await
        .unwrap();

        let decoded = decode::<Claims>(
            &response.token,
            &DecodingKey::from_secret("test-secret".as_bytes()),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, user.id.to_string());
        assert_eq!(decoded.claims.email, "ada@example.com");
        assert_eq!(decoded.claims.role, "CUSTOMER");
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let state = test_state();
        register(State(state.clone()), Json(register_request("ada@example.com")))
            .await
            .unwrap();

        let err = login(
            State(state),
            Json(LoginRequest {
                email: "ada@example.com".into(),
                password: Masked::new("wrong-password".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn test_login_rejects_unknown_email() {
        let state = test_state();
        let err = login(
            State(state),
            Json(LoginRequest {
                email: "nobody@example.com".into(),
                password: Masked::new("correct-horse".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::AuthenticationError(_)));
    }
}
