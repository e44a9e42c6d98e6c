/// Caller's profile
///
/// # Endpoints
///
/// - `GET /me/profile` - profile text with skills and educations
/// - `PUT /me/profile` - update the non-blank fields given

use axum::{extract::State, Extension, Json};
use roadmate_shared::{
    auth::Identity,
    models::profile::{Education, Profile, ProfileChanges, Skill},
};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

/// Full profile view
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    #[serde(flatten)]
    pub profile: Profile,
    pub skills: Vec<Skill>,
    pub educations: Vec<Education>,
}

/// Partial update; blank and missing fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProfileResponse {
    pub ok: bool,
    pub updated: u64,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ProfileResponse>> {
    let (profile, skills, educations) = state
        .bounded(async {
            let profile = Profile::find(&state.db, identity.user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;
            let skills = Skill::list(&state.db, identity.user_id).await?;
            let educations = Education::list(&state.db, identity.user_id).await?;
            Ok((profile, skills, educations))
        })
        .await?;

    Ok(Json(ProfileResponse {
        username: identity.username,
        profile,
        skills,
        educations,
    }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UpdateProfileResponse>> {
    let changes = ProfileChanges::from_input(
        req.name.as_deref(),
        req.headline.as_deref(),
        req.bio.as_deref(),
    );

    let updated = state
        .bounded(async { Ok(Profile::update(&state.db, identity.user_id, &changes).await?) })
        .await?;

    Ok(Json(UpdateProfileResponse { ok: true, updated }))
}
