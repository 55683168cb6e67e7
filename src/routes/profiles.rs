use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::profile_dto::UpsertProfilePayload, error::Result, middleware::auth::AuthUser, AppState,
};

#[axum::debug_handler]
pub async fn upsert_my_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpsertProfilePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let profile = state.profile_service.upsert(user.id, payload).await?;
    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn get_my_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let profile = state.profile_service.get(user.id).await?;
    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let profile = state.profile_service.get(user_id).await?;
    Ok(Json(profile))
}
