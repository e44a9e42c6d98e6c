/// Board tasks
///
/// Tasks belong to a project and sit in one of four status columns. Inside a
/// column they are ordered by `sort_index` (see [`crate::rank`]).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('backlog', 'inProgress', 'blocked', 'done');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     details TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'backlog',
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     difficulty INTEGER NOT NULL DEFAULT 2 CHECK (difficulty BETWEEN 1 AND 5),
///     sort_index INTEGER NOT NULL CHECK (sort_index >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tasks_partition_rank_key
///         UNIQUE (project_id, status, sort_index) DEFERRABLE INITIALLY IMMEDIATE
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use roadmate_shared::auth::Identity;
/// use roadmate_shared::models::task::{NewTask, Task, TaskStatus};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, identity: Identity, project_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let mut tx = pool.begin().await?;
/// let task = Task::insert_ranked(&mut tx, &identity, project_id, NewTask {
///     title: "Write docs".to_string(),
///     details: String::new(),
///     status: TaskStatus::Backlog,
///     assignee_id: None,
///     difficulty: 2,
///     sort_index: Some(0),
/// }).await?;
/// tx.commit().await?;
///
/// assert_eq!(task.sort_index, 0);
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::auth::authorization::{self, AuthzError};
use crate::auth::Identity;
use crate::rank::{self, Partition, RankError};

/// Lowest accepted difficulty
pub const MIN_DIFFICULTY: i32 = 1;

/// Highest accepted difficulty
pub const MAX_DIFFICULTY: i32 = 5;

/// Difficulty used when the client sends none (or zero)
pub const DEFAULT_DIFFICULTY: i32 = 2;

/// Board column
///
/// Declaration order matches the enum order in Postgres, which is also the
/// order columns are listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    #[default]
    Backlog,
    InProgress,
    Blocked,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Backlog => "backlog",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backlog" => Ok(TaskStatus::Backlog),
            "inProgress" => Ok(TaskStatus::InProgress),
            "blocked" => Ok(TaskStatus::Blocked),
            "done" => Ok(TaskStatus::Done),
            other => Err(format!("invalid status: {}", other)),
        }
    }
}

/// Task row joined with the assignee's username
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub details: String,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
    pub assignee_username: Option<String>,
    pub difficulty: i32,
    pub sort_index: i32,
    pub created_at: DateTime<Utc>,
}

/// Input for [`Task::insert_ranked`]
///
/// Already trimmed and range-checked by the caller; `sort_index` is the
/// requested position, `None` meaning "append".
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub details: String,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
    pub difficulty: i32,
    pub sort_index: Option<i32>,
}

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Caller may not touch this project
    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Requested position is unusable
    #[error(transparent)]
    Rank(#[from] RankError),

    /// Assignee is not on the project's roster
    #[error("Assignee {0} is not a member of this project")]
    AssigneeNotMember(Uuid),

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl Task {
    /// Inserts a task at its rank, shifting the column when needed
    ///
    /// Runs entirely on `conn`, which must be a transaction. In order:
    ///
    /// 1. reject a negative `sort_index` (no storage access)
    /// 2. require the caller on the roster, key-locking the project row and
    ///    then the membership row
    /// 3. require the assignee on the roster, if one is given
    /// 4. lock the column, shift, and reserve the index
    /// 5. insert and return the row with the assignee's username
    ///
    /// Nothing is written before step 4, so a non-member never changes a row.
    /// Dropping the transaction at any point undoes the shift.
    pub async fn insert_ranked(
        conn: &mut PgConnection,
        identity: &Identity,
        project_id: Uuid,
        data: NewTask,
    ) -> Result<Self, TaskError> {
        rank::check_requested(data.sort_index)?;

        authorization::require_member(conn, identity, project_id).await?;

        if let Some(assignee_id) = data.assignee_id {
            if !authorization::roster_contains(conn, project_id, assignee_id).await? {
                return Err(TaskError::AssigneeNotMember(assignee_id));
            }
        }

        let partition = Partition::new(project_id, data.status);
        let sort_index = rank::reserve(conn, &partition, data.sort_index).await?;

        let task = sqlx::query_as::<_, Task>(
            r#"
            WITH inserted AS (
                INSERT INTO tasks (project_id, title, details, status, assignee_id, difficulty, sort_index)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            SELECT i.id, i.project_id, i.title, i.details, i.status, i.assignee_id,
                   u.username AS assignee_username, i.difficulty, i.sort_index, i.created_at
            FROM inserted i
            LEFT JOIN users u ON u.id = i.assignee_id
            "#,
        )
        .bind(project_id)
        .bind(&data.title)
        .bind(&data.details)
        .bind(data.status)
        .bind(data.assignee_id)
        .bind(data.difficulty)
        .bind(sort_index)
        .fetch_one(conn)
        .await?;

        tracing::info!(
            task_id = %task.id,
            project_id = %project_id,
            user_id = %identity.user_id,
            status = task.status.as_str(),
            sort_index = task.sort_index,
            "Inserted task"
        );

        Ok(task)
    }

    /// Lists a project's tasks by column, then rank
    pub async fn list_for_project(
        conn: &mut PgConnection,
        identity: &Identity,
        project_id: Uuid,
    ) -> Result<Vec<Self>, TaskError> {
        authorization::require_member(conn, identity, project_id).await?;

        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.project_id, t.title, t.details, t.status, t.assignee_id,
                   u.username AS assignee_username, t.difficulty, t.sort_index, t.created_at
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assignee_id
            WHERE t.project_id = $1
            ORDER BY t.status ASC, t.sort_index ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(conn)
        .await?;

        Ok(tasks)
    }
}

/// Checks a difficulty, mapping 0 to the default
pub fn normalize_difficulty(raw: Option<i32>) -> Result<i32, String> {
    match raw.unwrap_or(0) {
        0 => Ok(DEFAULT_DIFFICULTY),
        d if (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&d) => Ok(d),
        d => Err(format!(
            "difficulty must be between {} and {}, got {}",
            MIN_DIFFICULTY, MAX_DIFFICULTY, d
        )),
    }
}

/// Parses an optional status, blank meaning backlog
pub fn parse_status(raw: Option<&str>) -> Result<TaskStatus, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(TaskStatus::Backlog),
        Some(s) => s.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_forms() {
        for status in [
            TaskStatus::Backlog,
            TaskStatus::InProgress,
            TaskStatus::Blocked,
            TaskStatus::Done,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(status.to_string())
            );
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(None).unwrap(), TaskStatus::Backlog);
        assert_eq!(parse_status(Some("  ")).unwrap(), TaskStatus::Backlog);
        assert_eq!(parse_status(Some("inProgress")).unwrap(), TaskStatus::InProgress);
        assert!(parse_status(Some("in-progress")).is_err());
        assert!(parse_status(Some("Done")).is_err());
    }

    #[test]
    fn test_normalize_difficulty() {
        assert_eq!(normalize_difficulty(None).unwrap(), DEFAULT_DIFFICULTY);
        assert_eq!(normalize_difficulty(Some(0)).unwrap(), DEFAULT_DIFFICULTY);
        assert_eq!(normalize_difficulty(Some(1)).unwrap(), 1);
        assert_eq!(normalize_difficulty(Some(5)).unwrap(), 5);
        assert!(normalize_difficulty(Some(6)).is_err());
        assert!(normalize_difficulty(Some(-1)).is_err());
    }

    #[test]
    fn test_task_error_wraps_authz() {
        let project_id = Uuid::new_v4();
        let err: TaskError = AuthzError::NotAMember(project_id).into();
        assert!(matches!(err, TaskError::Authz(AuthzError::NotAMember(id)) if id == project_id));
    }
}
