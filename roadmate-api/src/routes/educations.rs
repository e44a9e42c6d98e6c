/// Caller's education history
///
/// # Endpoints
///
/// - `POST /me/educations` - add an entry
/// - `PUT /me/educations` - replace an entry
/// - `DELETE /me/educations/:id` - remove an entry
///
/// Years use the `startyear` / `endyear` field names on the wire.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use roadmate_shared::{
    auth::Identity,
    models::profile::{Education, EducationInput},
};
use serde::Deserialize;
use uuid::Uuid;

use super::OkResponse;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};

#[derive(Debug, Deserialize)]
pub struct EducationRequest {
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub major: String,
    #[serde(rename = "startyear", default)]
    pub start_year: i32,
    #[serde(rename = "endyear", default)]
    pub end_year: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEducationRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: EducationRequest,
}

impl EducationRequest {
    fn to_input(&self) -> ApiResult<EducationInput> {
        EducationInput::new(
            &self.school,
            &self.degree,
            &self.major,
            self.start_year,
            self.end_year,
        )
        .map_err(ApiError::BadRequest)
    }
}

fn education_not_found() -> ApiError {
    ApiError::NotFound("Education not found".to_string())
}

/// Adds an education entry
///
/// # Errors
///
/// - `400 Bad Request`: blank field, missing year, or end before start
/// - `409 Conflict`: identical entry already exists
pub async fn create_education(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<EducationRequest>,
) -> ApiResult<Json<Education>> {
    let input = req.to_input()?;

    let education = state
        .bounded(async { Ok(Education::create(&state.db, identity.user_id, &input).await?) })
        .await?;

    Ok(Json(education))
}

pub async fn update_education(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdateEducationRequest>,
) -> ApiResult<Json<Education>> {
    let input = req.fields.to_input()?;

    let education = state
        .bounded(async {
            Education::update(&state.db, identity.user_id, req.id, &input)
                .await?
                .ok_or_else(education_not_found)
        })
        .await?;

    Ok(Json(education))
}

pub async fn delete_education(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OkResponse>> {
    let deleted = state
        .bounded(async { Ok(Education::delete(&state.db, identity.user_id, id).await?) })
        .await?;

    if !deleted {
        return Err(education_not_found());
    }

    Ok(Json(OkResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        let req: UpdateEducationRequest = serde_json::from_str(
            r#"{
                "id": "6f1c1c2e-8a5e-4a36-9a39-1c2f0b7b6a10",
                "school": "MIT",
                "degree": "BSc",
                "major": "CS",
                "startyear": 2019,
                "endyear": 2023
            }"#,
        )
        .unwrap();

        assert_eq!(req.fields.start_year, 2019);
        assert!(req.fields.to_input().is_ok());
    }

    #[test]
    fn test_missing_years_rejected() {
        let req: EducationRequest =
            serde_json::from_str(r#"{"school": "MIT", "degree": "BSc", "major": "CS"}"#).unwrap();

        assert!(matches!(req.to_input(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_end_before_start_rejected() {
        let req = EducationRequest {
            school: "MIT".to_string(),
            degree: "BSc".to_string(),
            major: "CS".to_string(),
            start_year: 2023,
            end_year: 2019,
        };

        assert!(matches!(req.to_input(), Err(ApiError::BadRequest(_))));
    }
}
