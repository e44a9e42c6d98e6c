/// Authentication and authorization primitives
///
/// This module holds the pieces every mutating request passes through:
///
/// # Modules
///
/// - [`jwt`]: Credential codec (signs and verifies identity tokens)
/// - [`password`]: Argon2id password hashing and verification
/// - [`middleware`]: Authorization gate that turns a bearer token into an [`Identity`]
/// - [`authorization`]: Project membership and ownership checks
///
/// # Request Flow
///
/// ```text
/// request ─► gate (verify token) ─► handler ─► membership check ─► storage
/// ```
///
/// # Example
///
/// ```no_run
/// use roadmate_shared::auth::jwt::TokenSigner;
/// use roadmate_shared::auth::password::{check_password, hash_password};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("longenough1")?;
/// check_password(&hash, "longenough1")?;
///
/// let signer = TokenSigner::new(b"a-secret-of-at-least-thirty-two-bytes!");
/// let token = signer.issue(Uuid::new_v4(), "alice")?;
/// let identity = signer.verify(&token)?;
/// assert_eq!(identity.username, "alice");
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;

/// Authenticated caller, rebuilt from a verified token on every request
///
/// The gate inserts this into request extensions; handlers extract it with
/// `Extension<Identity>` and pass it by reference to the authorizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stored credential ID
    pub user_id: Uuid,

    /// Username as stored at signup
    pub username: String,
}

impl Identity {
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}
