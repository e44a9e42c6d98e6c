/// Project roster endpoints (owner only)
///
/// # Endpoints
///
/// - `POST /me/projects/:id/members` - add a user by username
/// - `DELETE /me/projects/:id/members/:user_id` - remove a member
///
/// The owner check only takes a no-key lock on the project row, so task
/// inserts keep running. Removal then waits on the membership row for any
/// insert that has already checked that member's access.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use roadmate_shared::{
    auth::{authorization, Identity},
    models::{
        membership::{normalize_role_key, ProjectMember},
        user::User,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::OkResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[serde(rename = "roleKey")]
    #[validate(length(min = 1, max = 64, message = "roleKey must be 1-64 characters"))]
    pub role_key: String,
}

/// Adds a user to the project's roster
///
/// # Errors
///
/// - `403 Forbidden`: caller is not the owner, or the project is gone
/// - `404 Not Found`: no user with that username
/// - `409 Conflict`: user is already a member
pub async fn add_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<ProjectMember>> {
    req.validate()?;
    let role_key = normalize_role_key(&req.role_key).map_err(ApiError::BadRequest)?;

    let member = state
        .bounded(async {
            let mut tx = state.db.begin().await?;
            authorization::require_owner(&mut tx, &identity, project_id).await?;

            let user = User::find_by_username(&state.db, req.username.trim())
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

            let member =
                ProjectMember::add(&mut tx, project_id, user.id, &user.username, role_key).await?;
            tx.commit().await?;
            Ok(member)
        })
        .await?;

    tracing::info!(
        project_id = %project_id,
        member_id = %member.user_id,
        "Added project member"
    );

    Ok(Json(member))
}

/// Removes a member from the roster
///
/// # Errors
///
/// - `403 Forbidden`: caller is not the owner, or the project is gone
/// - `400 Bad Request`: the owner tried to remove themself
/// - `404 Not Found`: user is not on the roster
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<OkResponse>> {
    state
        .bounded(async {
            let mut tx = state.db.begin().await?;
            authorization::require_owner(&mut tx, &identity, project_id).await?;

            if user_id == identity.user_id {
                return Err(ApiError::BadRequest(
                    "The owner cannot be removed from their project".to_string(),
                ));
            }

            if !ProjectMember::remove(&mut tx, project_id, user_id).await? {
                return Err(ApiError::NotFound("Member not found".to_string()));
            }

            tx.commit().await?;
            Ok(())
        })
        .await?;

    tracing::info!(project_id = %project_id, member_id = %user_id, "Removed project member");

    Ok(Json(OkResponse { ok: true }))
}
