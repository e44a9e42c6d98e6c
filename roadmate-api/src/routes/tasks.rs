/// Task board endpoints
///
/// # Endpoints
///
/// - `POST /me/projects/:id/tasks` - insert a task at a rank
/// - `GET /me/projects/:id/tasks` - all tasks, by column then rank
///
/// # Request
///
/// ```json
/// {
///   "title": "Write docs",
///   "details": "",
///   "status": "inProgress",
///   "assignee_id": "uuid or empty",
///   "difficulty": 3,
///   "sort_index": 0
/// }
/// ```
///
/// Everything but `title` is optional. Omitting `sort_index` appends to the
/// end of the column; giving one moves the tasks at and after it down.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use roadmate_shared::{
    auth::Identity,
    models::task::{normalize_difficulty, parse_status, NewTask, Task},
    rank,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub details: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    /// Empty string means unassigned
    #[serde(default)]
    pub assignee_id: Option<String>,

    #[serde(default)]
    pub difficulty: Option<i32>,

    #[serde(default)]
    pub sort_index: Option<i32>,
}

impl CreateTaskRequest {
    /// Resolves defaults and rejects malformed values without touching storage
    pub fn into_new_task(self) -> ApiResult<NewTask> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ApiError::BadRequest("title is required".to_string()));
        }

        let status = parse_status(self.status.as_deref()).map_err(ApiError::BadRequest)?;
        let difficulty = normalize_difficulty(self.difficulty).map_err(ApiError::BadRequest)?;
        rank::check_requested(self.sort_index)?;

        let assignee_id = match self.assignee_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Uuid::parse_str(raw)
                    .map_err(|_| ApiError::BadRequest("assignee_id is not a valid id".to_string()))?,
            ),
        };

        Ok(NewTask {
            title: title.to_string(),
            details: self.details.unwrap_or_default().trim().to_string(),
            status,
            assignee_id,
            difficulty,
            sort_index: self.sort_index,
        })
    }
}

/// Inserts a task into the project's board
///
/// The membership check, column shift and insert share one transaction.
///
/// # Errors
///
/// - `400 Bad Request`: blank title, bad status, difficulty out of 1-5,
///   negative `sort_index`, or an assignee who is not a member
/// - `403 Forbidden`: caller is not a member, or the project is gone
pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;
    let new_task = req.into_new_task()?;

    let task = state
        .bounded(async {
            let mut tx = state.db.begin().await?;
            let task = Task::insert_ranked(&mut tx, &identity, project_id, new_task).await?;
            tx.commit().await?;
            Ok(task)
        })
        .await?;

    Ok(Json(task))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state
        .bounded(async {
            let mut tx = state.db.begin().await?;
            let tasks = Task::list_for_project(&mut tx, &identity, project_id).await?;
            tx.commit().await?;
            Ok(tasks)
        })
        .await?;

    Ok(Json(tasks))
}
