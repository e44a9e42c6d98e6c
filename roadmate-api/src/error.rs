/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Lower-level errors convert into
/// [`ApiError`] with `?`, and each variant renders as a fixed status code
/// with a stable `error` kind:
///
/// | Variant           | Status | `error`             |
/// |-------------------|--------|---------------------|
/// | `BadRequest`      | 400    | `invalid_argument`  |
/// | `Unauthorized`    | 401    | `unauthorized`      |
/// | `Forbidden`       | 403    | `forbidden`         |
/// | `NotFound`        | 404    | `not_found`         |
/// | `Conflict`        | 409    | `conflict`          |
/// | `ValidationError` | 422    | `validation_error`  |
/// | `InternalError`   | 500    | `internal_error`    |
/// | `Timeout`         | 504    | `timeout`           |
///
/// Storage error text never reaches the client; internal errors are logged
/// and replaced with a generic message.
///
/// # Example
///
/// ```
/// use roadmate_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(name: String) -> ApiResult<Json<Value>> {
///     if name.trim().is_empty() {
///         return Err(ApiError::BadRequest("name is required".to_string()));
///     }
///     Ok(Json(json!({ "name": name })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use roadmate_shared::auth::{
    authorization::AuthzError, jwt::JwtError, middleware::UNAUTHENTICATED_MESSAGE,
    password::PasswordError,
};
use roadmate_shared::models::task::TaskError;
use roadmate_shared::rank::RankError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Message for every project-scoped 403, whether the project is missing or
/// the caller lacks access
pub const FORBIDDEN_MESSAGE: &str = "You do not have access to this project";

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or out-of-range input (400)
    BadRequest(String),

    /// Missing or rejected credentials (401)
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Uniqueness violation (409)
    Conflict(String),

    /// Request body failed declarative validation (422)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Request deadline elapsed (504)
    Timeout,

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable error kind (e.g. "invalid_argument", "forbidden")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Per-field validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// The uniform 403 for project-scoped resources
    pub fn forbidden() -> Self {
        ApiError::Forbidden(FORBIDDEN_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable identifier rendered in the `error` field
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "invalid_argument",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::Timeout => "timeout",
            ApiError::InternalError(_) => "internal_error",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Timeout => write!(f, "Request timed out"),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.kind().to_string();

        let (message, details) = match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => (msg, None),
            ApiError::ValidationError(errors) => {
                ("Request validation failed".to_string(), Some(errors))
            }
            ApiError::Timeout => {
                tracing::warn!("Request deadline elapsed");
                ("The request took too long and was cancelled".to_string(), None)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("An internal error occurred".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error,
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Picks the conflict message for a violated unique constraint
fn conflict_message(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_username_lower_key") => "Username is already taken",
        Some("skills_user_name_lower_key") => "Skill already exists",
        Some("educations_unique_entry") => "Education already exists",
        Some("project_members_pkey") => "User is already a member of this project",
        _ => "Resource already exists",
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    return ApiError::Conflict(conflict_message(db_err.constraint()).to_string());
                }

                if db_err.is_foreign_key_violation() || db_err.is_check_violation() {
                    tracing::debug!(constraint = ?db_err.constraint(), "Constraint rejected input");
                    return ApiError::BadRequest("Request violates a data constraint".to_string());
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Membership and ownership failures share one 403
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::NotAMember(_) | AuthzError::NotOwner(_) => ApiError::forbidden(),
            AuthzError::DatabaseError(err) => err.into(),
        }
    }
}

impl From<RankError> for ApiError {
    fn from(err: RankError) -> Self {
        match err {
            RankError::NegativeIndex(_) => ApiError::BadRequest(err.to_string()),
            RankError::DatabaseError(err) => err.into(),
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Authz(err) => err.into(),
            TaskError::Rank(err) => err.into(),
            TaskError::AssigneeNotMember(_) => {
                ApiError::BadRequest("assignee_id must be a member of the project".to_string())
            }
            TaskError::DatabaseError(err) => err.into(),
        }
    }
}

/// A mismatch is a failed login; anything else is a server fault
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch => ApiError::Unauthorized(UNAUTHENTICATED_MESSAGE.to_string()),
            other => ApiError::InternalError(format!("Password operation failed: {}", other)),
        }
    }
}

/// Signing failures are internal; verification failures never say why
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            other => {
                tracing::debug!(reason = %other, "Token rejected");
                ApiError::Unauthorized(UNAUTHENTICATED_MESSAGE.to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}
