/// Credential codec: identity token issuing and verification
///
/// Tokens are standard three-segment JWTs signed with HS256 over a single
/// shared secret. They are stateless bearer credentials: verification never
/// touches storage, so a token stays valid until it expires.
///
/// # Claims
///
/// - `sub`: user ID
/// - `usr`: username
/// - `iss`: always "roadmate"
/// - `iat`: issued at (Unix seconds)
/// - `exp`: expires at (Unix seconds), `iat` + 7 days
///
/// # Failure Modes
///
/// | Error                | Cause                                              |
/// |----------------------|----------------------------------------------------|
/// | `Malformed`          | not three segments, bad header/claims, wrong issuer |
/// | `Expired`            | `now > exp`, whatever the signature says           |
/// | `InvalidSignature`   | well-formed, unexpired, but the MAC does not match |
///
/// # Example
///
/// ```
/// use roadmate_shared::auth::jwt::TokenSigner;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let signer = TokenSigner::new(b"your-secret-key-at-least-32-bytes");
/// let user_id = Uuid::new_v4();
///
/// let token = signer.issue(user_id, "alice")?;
/// let identity = signer.verify(&token)?;
///
/// assert_eq!(identity.user_id, user_id);
/// assert_eq!(identity.username, "alice");
/// # Ok(())
/// # }
/// ```

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identity;

/// Issuer stamped into and required from every token
pub const ISSUER: &str = "roadmate";

/// Fixed token lifetime in days
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign a token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token is well-formed but its signature does not verify
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Token expiry is in the past
    #[error("Token has expired")]
    Expired,

    /// Token cannot be decoded into the expected claim shape
    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Username
    pub usr: String,

    /// Issuer - always "roadmate"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for `user_id` expiring [`TOKEN_TTL_DAYS`] from now
    pub fn new(user_id: Uuid, username: impl Into<String>) -> Self {
        Self::with_expiration(user_id, username, Duration::days(TOKEN_TTL_DAYS))
    }

    /// Creates claims with a custom lifetime
    ///
    /// A negative `expires_in` yields claims that are already expired, which
    /// is how the tests build stale tokens.
    pub fn with_expiration(
        user_id: Uuid,
        username: impl Into<String>,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            usr: username.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// True once the wall clock has passed `exp`
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Identity asserted by these claims
    pub fn identity(&self) -> Identity {
        Identity::new(self.sub, self.usr.clone())
    }
}

/// Signs and verifies tokens with one process-wide secret
///
/// Built once at startup from configuration and shared read-only; nothing
/// about it changes after construction.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    /// Shape-only pass: header, claims, issuer. No MAC, no expiry.
    shape: Validation,
    /// Full pass: MAC and expiry.
    strict: Validation,
}

impl TokenSigner {
    /// Creates a signer from the raw shared secret
    pub fn new(secret: &[u8]) -> Self {
        let mut strict = Validation::new(Algorithm::HS256);
        strict.set_issuer(&[ISSUER]);
        strict.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);
        strict.validate_exp = true;
        strict.leeway = 0;

        let mut shape = strict.clone();
        shape.insecure_disable_signature_validation();
        shape.validate_exp = false;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            shape,
            strict,
        }
    }

    /// Issues a token for the given identity, valid for [`TOKEN_TTL_DAYS`]
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String, JwtError> {
        self.sign(&Claims::new(user_id, username))
    }

    /// Signs arbitrary claims
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and returns the identity it carries
    pub fn verify(&self, token: &str) -> Result<Identity, JwtError> {
        self.verify_claims(token).map(|claims| claims.identity())
    }

    /// Verifies a token and returns its full claims
    ///
    /// Expiry is judged before the MAC, so a stale token reports `Expired`
    /// even when its signature has been tampered with.
    pub fn verify_claims(&self, token: &str) -> Result<Claims, JwtError> {
        let unverified = decode::<Claims>(token, &self.decoding, &self.shape)
            .map_err(|e| JwtError::Malformed(e.to_string()))?
            .claims;

        if unverified.is_expired() {
            return Err(JwtError::Expired);
        }

        // Header and claims decoded above, so anything failing here is the signature.
        let verified = decode::<Claims>(token, &self.decoding, &self.strict).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::InvalidSignature,
            }
        })?;

        Ok(verified.claims)
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &Algorithm::HS256)
            .field("issuer", &ISSUER)
            .finish_non_exhaustive()
    }
}
