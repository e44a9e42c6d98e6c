/// Caller's skills
///
/// # Endpoints
///
/// - `POST /me/skills` - add a skill
/// - `PUT /me/skills` - change a skill's proficiency
/// - `DELETE /me/skills/:id` - remove a skill
///
/// Skills belong to the caller, so an unknown id is a plain 404.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use roadmate_shared::{
    auth::Identity,
    models::profile::Skill,
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
pub struct CreateSkillRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(range(
        min = 1,
        max = 10,
        message = "Proficiency must be between 1 and 10"
    ))]
    pub proficiency: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSkillRequest {
    pub id: Uuid,

    #[validate(range(
        min = 1,
        max = 10,
        message = "Proficiency must be between 1 and 10"
    ))]
    pub proficiency: i32,
}

fn skill_not_found() -> ApiError {
    ApiError::NotFound("Skill not found".to_string())
}

/// Adds a skill
///
/// # Errors
///
/// - `400 Bad Request`: name is blank after trimming
/// - `409 Conflict`: the caller already has this skill (any letter case)
pub async fn create_skill(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateSkillRequest>,
) -> ApiResult<Json<Skill>> {
    req.validate()?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }

    let skill = state
        .bounded(async {
            Ok(Skill::create(&state.db, identity.user_id, name, req.proficiency).await?)
        })
        .await?;

    Ok(Json(skill))
}

pub async fn update_skill(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdateSkillRequest>,
) -> ApiResult<Json<Skill>> {
    req.validate()?;

    let skill = state
        .bounded(async {
            Skill::update_proficiency(&state.db, identity.user_id, req.id, req.proficiency)
                .await?
                .ok_or_else(skill_not_found)
        })
        .await?;

    Ok(Json(skill))
}

pub async fn delete_skill(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    let deleted = state
        .bounded(async { Ok(Skill::delete(&state.db, identity.user_id, id).await?) })
        .await?;

    if !deleted {
        return Err(skill_not_found());
    }

    Ok(Json(OkResponse { ok: true }))
}
