/// Account endpoints
///
/// # Endpoints
///
/// - `POST /auth/signup` - create an account and get a token
/// - `POST /auth/login` - exchange credentials for a token
/// - `GET /auth/validUsername?username=` - check whether a username is free
///
/// Signup and login answer with the same shape:
///
/// ```json
/// { "token": "eyJ...", "userId": "uuid", "username": "alice" }
/// ```

use axum::{
    extract::{Query, State},
    Json,
};
use roadmate_shared::{
    auth::{middleware::UNAUTHENTICATED_MESSAGE, password},
    models::{
        profile::Profile,
        user::{normalize_username, User},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token response for signup and login
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_id: Uuid,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsernameAvailability {
    pub available: bool,
}

fn field_error(field: &str, message: String) -> ApiError {
    ApiError::ValidationError(vec![ValidationErrorDetail {
        field: field.to_string(),
        message,
    }])
}

/// Creates an account
///
/// The credential row and its empty profile are written in one transaction.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: username or password out of range
/// - `409 Conflict`: username taken (in any letter case)
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let username = normalize_username(&req.username).map_err(|e| field_error("username", e))?;
    password::validate_password_strength(&req.password)
        .map_err(|e| field_error("password", e))?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .bounded(async {
            let mut tx = state.db.begin().await?;
            let user = User::create(&mut tx, username, &password_hash).await?;
            Profile::create_empty(&mut tx, user.id).await?;
            tx.commit().await?;
            Ok(user)
        })
        .await?;

    tracing::info!(user_id = %user.id, "Account created");

    let token = state.signer.issue(user.id, &user.username)?;

    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

/// Exchanges credentials for a token
///
/// An unknown username and a wrong password produce the same 401, and both
/// cost one password verification.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let found = state
        .bounded(async { Ok(User::find_by_username(&state.db, req.username.trim()).await?) })
        .await?;

    let Some(user) = found else {
        password::burn_verification(&req.password);
        tracing::debug!("Login for unknown username");
        return Err(ApiError::Unauthorized(UNAUTHENTICATED_MESSAGE.to_string()));
    };

    password::check_password(&user.password_hash, &req.password).map_err(|e| {
        tracing::debug!(user_id = %user.id, reason = %e, "Login rejected");
        ApiError::from(e)
    })?;

    let token = state.signer.issue(user.id, &user.username)?;

    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
        username: user.username,
    }))
}

/// Reports whether a username could be used for signup
///
/// A name that would fail signup validation is reported as unavailable.
pub async fn valid_username(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> ApiResult<Json<UsernameAvailability>> {
    let raw = query.username.unwrap_or_default();
    if raw.trim().is_empty() {
        return Err(ApiError::BadRequest("username is required".to_string()));
    }

    let Ok(username) = normalize_username(&raw) else {
        return Ok(Json(UsernameAvailability { available: false }));
    };

    let taken = state
        .bounded(async { Ok(User::username_exists(&state.db, username).await?) })
        .await?;

    Ok(Json(UsernameAvailability { available: !taken }))
}
