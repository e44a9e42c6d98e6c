/// Project endpoints
///
/// # Endpoints
///
/// - `GET /me/projects` - projects the caller belongs to, with rosters
/// - `POST /me/projects` - create a project owned by the caller
/// - `PUT /me/projects` - rename / redescribe (owner only)
/// - `DELETE /me/projects/:id` - delete with roster and tasks (owner only)
///
/// A project that does not exist and a project the caller may not touch
/// produce the same 403.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use roadmate_shared::{
    auth::{authorization, Identity},
    models::{
        membership::{normalize_role_key, DEFAULT_ROLE_KEY},
        project::{Project, ProjectWithMembers},
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
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Owner's role on the new project
    #[serde(rename = "roleKey", default)]
    pub role_key: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    pub id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[serde(default)]
    pub description: String,
}

fn required_name(raw: &str) -> ApiResult<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    Ok(name)
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<ProjectWithMembers>>> {
    let projects = state
        .bounded(async {
            let mut tx = state.db.begin().await?;
            let projects = Project::list_with_members(&mut tx, &identity).await?;
            tx.commit().await?;
            Ok(projects)
        })
        .await?;

    Ok(Json(projects))
}

/// Creates a project with the caller as owner and first member
///
/// # Errors
///
/// - `422 Unprocessable Entity`: name missing or too long
/// - `400 Bad Request`: name blank after trimming, or unusable `roleKey`
pub async fn create_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<Json<ProjectWithMembers>> {
    req.validate()?;

    let name = required_name(&req.name)?;
    let description = req.description.as_deref().map(str::trim).unwrap_or_default();
    let role_key = match req.role_key.as_deref() {
        Some(raw) if !raw.trim().is_empty() => {
            normalize_role_key(raw).map_err(ApiError::BadRequest)?
        }
        _ => DEFAULT_ROLE_KEY,
    };

    let project = state
        .bounded(async {
            let mut tx = state.db.begin().await?;
            let project =
                Project::create_with_owner(&mut tx, &identity, name, description, role_key)
                    .await?;
            tx.commit().await?;
            Ok(project)
        })
        .await?;

    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    req.validate()?;

    let name = required_name(&req.name)?;
    let description = req.description.trim();

    let project = state
        .bounded(async {
            let mut tx = state.db.begin().await?;
            authorization::require_owner(&mut tx, &identity, req.id).await?;
            let project = Project::update(&mut tx, req.id, name, description)
                .await?
                .ok_or_else(ApiError::forbidden)?;
            tx.commit().await?;
            Ok(project)
        })
        .await?;

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    state
        .bounded(async {
            let mut tx = state.db.begin().await?;
            authorization::require_owner(&mut tx, &identity, project_id).await?;
            if !Project::delete(&mut tx, project_id).await? {
                return Err(ApiError::forbidden());
            }
            tx.commit().await?;
            Ok(())
        })
        .await?;

    tracing::info!(project_id = %project_id, user_id = %identity.user_id, "Deleted project");

    Ok(Json(OkResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let req: CreateProjectRequest = serde_json::from_str(r#"{"name": "Board"}"#).unwrap();

        assert!(req.validate().is_ok());
        assert!(req.description.is_none());
        assert!(req.role_key.is_none());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(required_name("   "), Err(ApiError::BadRequest(_))));
        assert_eq!(required_name("  Board ").unwrap(), "Board");
    }

    #[test]
    fn test_role_key_wire_name() {
        let req: CreateProjectRequest =
            serde_json::from_str(r#"{"name": "Board", "roleKey": "backend"}"#).unwrap();
        assert_eq!(req.role_key.as_deref(), Some("backend"));
    }
}
