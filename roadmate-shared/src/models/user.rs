/// Stored credentials
///
/// A user row holds only what login needs: the username and an Argon2id
/// password hash. Display data lives in [`profiles`](super::profile).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(32) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX users_username_lower_key ON users (lower(username));
/// ```
///
/// Uniqueness is enforced by the index. Callers treat a unique violation on
/// insert as "username taken" rather than checking first.
///
/// # Example
///
/// ```no_run
/// use roadmate_shared::models::user::User;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// let user = User::create(&mut tx, "alice", "$argon2id$...").await?;
/// tx.commit().await?;
///
/// let found = User::find_by_username(&pool, "ALICE").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Shortest accepted username, in characters
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Longest accepted username, in characters
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Stored credential
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Username as typed at signup (compared case-insensitively)
    pub username: String,

    /// Argon2id PHC string; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Inserts a new credential
    ///
    /// # Errors
    ///
    /// A unique violation (`users_username_lower_key`) if the username is
    /// already taken in any letter case.
    pub async fn create(
        conn: &mut PgConnection,
        username: &str,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(conn)
        .await
    }

    /// Finds a user by username, ignoring case
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE lower(username) = lower($1)
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether a username is taken, ignoring case
    pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users WHERE lower(username) = lower($1)
            )
            "#,
        )
        .bind(username)
        .fetch_one(pool)
        .await
    }
}

/// Trims a candidate username and checks its length
///
/// Returns the trimmed form that should be stored.
pub fn normalize_username(raw: &str) -> Result<&str, String> {
    let username = raw.trim();
    let length = username.chars().count();

    if length < MIN_USERNAME_LENGTH || length > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        ));
    }

    if username.chars().any(char::is_whitespace) {
        return Err("Username must not contain whitespace".to_string());
    }

    Ok(username)
}
