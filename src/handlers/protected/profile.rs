// handlers/protected/profile.rs - GET /api/keeper/profile, PUT /api/keeper/user

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::{ProfileUpdate, UserProfile};
use crate::error::ApiError;
use crate::handlers::validate::{check, parse_birth_date, validate_username_format};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// Editable profile fields. The email is the keeper-sso login and is not
/// part of this request; an `email` key in the body is ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: String,
    pub phone: Option<String>,
    /// `DD-MM-YYYY`
    pub birth_date: Option<String>,
    pub profile_image_url: Option<String>,
}

impl UpdateUserRequest {
    fn into_update(self) -> Result<ProfileUpdate, ApiError> {
        let username = self.username.trim().to_string();
        check("username", validate_username_format(&username))?;

        let birth_date = parse_birth_date(self.birth_date.as_deref())
            .map_err(|problem| ApiError::invalid_field("birth_date", problem))?;
        let phone = match self.phone.as_deref().map(str::trim) {
            None | Some("") => UserProfile::DEFAULT_PHONE.to_string(),
            Some(p) => p.to_string(),
        };

        Ok(ProfileUpdate {
            username,
            phone,
            birth_date,
            profile_image_url: self.profile_image_url.filter(|url| !url.trim().is_empty()),
        })
    }
}

/// GET /api/keeper/profile - the caller's own profile
pub async fn profile_get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let profile = state.keeper.profile(user.user_id).await?;
    Ok(ApiResponse::success(json!({ "user": profile })))
}

/// PUT /api/keeper/user - replace the caller's editable profile fields (not the email)
pub async fn user_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(req) = payload?;
    let update = req.into_update()?;

    let profile = state.keeper.update_profile(user.user_id, &update).await?;
    tracing::info!(user_id = user.user_id, "profile updated");
    Ok(ApiResponse::success(json!({ "user": profile })))
}
