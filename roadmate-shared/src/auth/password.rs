/// Password hashing module using Argon2id
///
/// Stored credentials only ever hold a PHC-format Argon2id hash. Verification
/// re-derives the hash from the candidate password and compares in constant
/// time (the comparison lives inside `argon2`'s `PasswordVerifier`).
///
/// # Parameters
///
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash
/// - **Salt**: 16 random bytes per hash
///
/// # Example
///
/// ```
/// use roadmate_shared::auth::password::{check_password, hash_password, PasswordError};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("longenough1")?;
///
/// check_password(&hash, "longenough1")?;
/// assert!(matches!(check_password(&hash, "wrong"), Err(PasswordError::Mismatch)));
/// # Ok(())
/// # }
/// ```

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length, in characters
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Password does not match the stored hash
    #[error("Password does not match")]
    Mismatch,

    /// Stored hash could not be parsed or verified
    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

fn argon2() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(65536) // 64 MB
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password using Argon2id
///
/// Returns the PHC string (algorithm, parameters, salt and hash):
///
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$<salt>$<hash>
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` only if the library itself fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a hash
///
/// Returns `Ok(true)` on match and `Ok(false)` on mismatch. Parameters are
/// read back from the PHC string, so hashes made with other costs still
/// verify.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash does not parse or
/// carries no salt or hash output.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    if parsed_hash.salt.is_none() || parsed_hash.hash.is_none() {
        return Err(PasswordError::InvalidHash(
            "Hash is missing its salt or output".to_string(),
        ));
    }

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::InvalidHash(format!("Verification failed: {}", e))),
    }
}

/// Checks a stored hash against a candidate password
///
/// # Errors
///
/// - `PasswordError::Mismatch` if the password is wrong
/// - `PasswordError::InvalidHash` if the stored hash is unusable
pub fn check_password(hash: &str, password: &str) -> Result<(), PasswordError> {
    if verify_password(password, hash)? {
        Ok(())
    } else {
        Err(PasswordError::Mismatch)
    }
}

static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH
        .get_or_init(|| hash_password("roadmate-dummy-password").ok())
        .as_deref()
}

/// Builds the throwaway hash used by `burn_verification`
///
/// Call once at startup so the first unknown-user login pays for one KDF
/// run, not two. Returns false if hashing failed.
pub fn warm_up() -> bool {
    dummy_hash().is_some()
}

/// Runs one full verification against a throwaway hash
///
/// Login calls this when the username is unknown so that "no such user"
/// costs the same KDF work as "wrong password". The result is discarded.
pub fn burn_verification(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

/// Validates password length
///
/// # Example
///
/// ```
/// use roadmate_shared::auth::password::validate_password_strength;
///
/// assert!(validate_password_strength("longenough1").is_ok());
/// assert!(validate_password_strength("short").is_err());
/// ```
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    let length = password.chars().count();

    if length < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at most {} characters long",
            MAX_PASSWORD_LENGTH
        ));
    }

    Ok(())
}
