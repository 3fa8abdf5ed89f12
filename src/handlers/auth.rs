// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Extension, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    extract::ApiJson,
    models::user::{AuthResponse, LoginRequest, NewUser, RegisterRequest, User},
    repository::{RepoError, UserRepository},
    response::{self, ApiResponse},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

fn issue_token(user: &User, config: &Config) -> Result<String, AppError> {
    sign_jwt(
        user.id,
        &user.name,
        &config.jwt_secret,
        config.jwt_expiration,
    )
}

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with a token and the user object (excluding password).
pub async fn register(
    State(users): State<Arc<dyn UserRepository>>,
    State(config): State<Config>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = RegisterRequest {
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_lowercase(),
        password: payload.password,
    };
    payload.validate()?;

    let password_hash = hash_password(&payload.password)?;

    let user = users
        .insert(NewUser {
            name: payload.name,
            email: payload.email.clone(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            RepoError::UniqueViolation(_) => {
                AppError::Conflict(format!("Email '{}' is already registered", payload.email))
            }
            other => {
                tracing::error!("Failed to register user: {:?}", other);
                other.into()
            }
        })?;

    tracing::info!(user_id = user.id, "user registered");
    let token = issue_token(&user, &config)?;
    Ok(response::created(AuthResponse { token, user }))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the email and password against the store.
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(users): State<Arc<dyn UserRepository>>,
    State(config): State<Config>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invalid = || AppError::AuthError("Invalid credentials".to_string());

    let email = payload.email.trim().to_lowercase();
    let user = users.find_by_email(&email).await?.ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(invalid());
    }

    let token = issue_token(&user, &config)?;
    Ok(ApiResponse::ok(AuthResponse { token, user }))
}

/// Returns the authenticated caller's profile.
pub async fn me(
    State(users): State<Arc<dyn UserRepository>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = users
        .find_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;
    Ok(ApiResponse::ok(user))
}
