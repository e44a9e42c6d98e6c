/// Project roster
///
/// A `project_members` row is what grants a user access to a project's
/// tasks. The owner gets one when the project is created; the owner adds
/// and removes everyone else.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     username VARCHAR(32) NOT NULL,
///     role_key VARCHAR(64) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```
///
/// `role_key` is a free-form label the client uses for display
/// ("frontend", "backend", "design", ...). It carries no permissions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

/// Role label given to a project's creator when none is supplied
pub const DEFAULT_ROLE_KEY: &str = "frontend";

/// Longest accepted role label
pub const MAX_ROLE_KEY_LENGTH: usize = 64;

/// One roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProjectMember {
    #[serde(skip_serializing)]
    pub project_id: Uuid,

    #[serde(rename = "id")]
    pub user_id: Uuid,

    pub username: String,

    #[serde(rename = "roleKey")]
    pub role_key: String,

    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
}

impl ProjectMember {
    /// Adds a user to a project
    ///
    /// # Errors
    ///
    /// A unique violation if the user is already on the roster, a foreign key
    /// violation if the project or user is gone.
    pub async fn add(
        conn: &mut PgConnection,
        project_id: Uuid,
        user_id: Uuid,
        username: &str,
        role_key: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectMember>(
            r#"
            INSERT INTO project_members (project_id, user_id, username, role_key)
            VALUES ($1, $2, $3, $4)
            RETURNING project_id, user_id, username, role_key, created_at
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(username)
        .bind(role_key)
        .fetch_one(conn)
        .await
    }

    /// Removes a user from a project
    ///
    /// Returns true if a row was deleted. Waits for any in-flight
    /// transaction holding the row `FOR SHARE` to finish first.
    pub async fn remove(
        conn: &mut PgConnection,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM project_members
            WHERE project_id = $1 AND user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the rosters of several projects in one query
    ///
    /// Rows come back alphabetically by username; callers group them by
    /// `project_id`.
    pub async fn list_for_projects(
        conn: &mut PgConnection,
        project_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, ProjectMember>(
            r#"
            SELECT project_id, user_id, username, role_key, created_at
            FROM project_members
            WHERE project_id = ANY($1)
            ORDER BY lower(username) ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(conn)
        .await
    }
}

/// Trims a role label and checks it is usable
pub fn normalize_role_key(raw: &str) -> Result<&str, String> {
    let role_key = raw.trim();

    if role_key.is_empty() {
        return Err("roleKey must not be blank".to_string());
    }

    if role_key.chars().count() > MAX_ROLE_KEY_LENGTH {
        return Err(format!(
            "roleKey must be at most {} characters",
            MAX_ROLE_KEY_LENGTH
        ));
    }

    Ok(role_key)
}
