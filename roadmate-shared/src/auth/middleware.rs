/// Authorization gate for Axum
///
/// Extracts the bearer credential from `Authorization: Bearer <token>`,
/// verifies it with the [`TokenSigner`], and inserts the resulting
/// [`Identity`] into request extensions. The gate only answers "who is
/// calling"; what they may do is decided later by
/// [`authorization`](super::authorization).
///
/// Every rejection renders the same 401 body. The reason (missing header,
/// wrong scheme, bad signature, expired, malformed) is logged at debug level
/// and never sent to the client.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use roadmate_shared::auth::{jwt::TokenSigner, middleware::require_identity, Identity};
///
/// async fn whoami(Extension(identity): Extension<Identity>) -> String {
///     identity.username
/// }
///
/// let signer = Arc::new(TokenSigner::new(b"your-secret-key-at-least-32-bytes"));
/// let app: Router = Router::new()
///     .route("/whoami", get(whoami))
///     .layer(middleware::from_fn_with_state(signer, require_identity));
/// ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::{JwtError, TokenSigner};
use super::Identity;

/// Message shared by every gate rejection
pub const UNAUTHENTICATED_MESSAGE: &str = "Invalid or missing credentials";

/// Why the gate rejected a request
///
/// Kept for logging; the HTTP response is identical for every variant.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No Authorization header, or not valid UTF-8
    #[error("missing authorization header")]
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    #[error("authorization header is not a bearer credential")]
    InvalidFormat,

    /// Token failed verification
    #[error("token rejected: {0}")]
    InvalidToken(#[from] JwtError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        tracing::debug!(reason = %self, "Rejected unauthenticated request");

        let body = Json(json!({
            "error": "unauthorized",
            "message": UNAUTHENTICATED_MESSAGE,
        }));

        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidFormat)?;

    if token.is_empty() {
        return Err(AuthError::InvalidFormat);
    }

    Ok(token)
}

/// Resolves the caller's identity from request headers
pub fn authenticate(signer: &TokenSigner, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let token = bearer_token(headers)?;
    Ok(signer.verify(token)?)
}

/// Gate middleware: verifies the bearer token and injects [`Identity`]
///
/// Use with `axum::middleware::from_fn_with_state(signer, require_identity)`.
/// Short-circuits with 401 before any handler runs.
pub async fn require_identity(
    State(signer): State<Arc<TokenSigner>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authenticate(&signer, req.headers())?;

    tracing::Span::current().record("user_id", tracing::field::display(identity.user_id));
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
