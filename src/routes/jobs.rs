use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::job_dto::{
        AcceptBidResponse, ApplicationListResponse, ApplyPayload, BidPayload, CreateJobPayload,
        JobBrowseQuery, JobListResponse, JobResponse, JobStatusPayload, MyApplicationsResponse,
        ReviewApplicationPayload, UpdateJobPayload,
    },
    error::Result,
    middleware::auth::AuthUser,
    utils::time::now,
    AppState,
};

#[axum::debug_handler]
pub async fn browse_jobs(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Query(query): Query<JobBrowseQuery>,
) -> Result<impl IntoResponse> {
    let result = state
        .job_service
        .browse(query, viewer.map(|v| v.id))
        .await?;
    Ok(Json(result))
}

#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state
        .job_service
        .get_for_viewer(id, viewer.map(|v| v.id))
        .await?;
    Ok(Json(job))
}

#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.create(user.id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(JobResponse::for_viewer(job, Some(user.id), None, now())),
    ))
}

#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let job = state.job_service.update(id, user.id, payload).await?;
    Ok(Json(JobResponse::for_viewer(job, Some(user.id), None, now())))
}

#[axum::debug_handler]
pub async fn change_job_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<JobStatusPayload>,
) -> Result<impl IntoResponse> {
    let job = state
        .job_service
        .change_status(id, user.id, payload.status)
        .await?;
    Ok(Json(JobResponse::for_viewer(job, Some(user.id), None, now())))
}

#[axum::debug_handler]
pub async fn apply_to_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplyPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state.job_service.apply(id, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[axum::debug_handler]
pub async fn withdraw_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, application_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let application = state
        .job_service
        .withdraw_application(id, application_id, user.id)
        .await?;
    Ok(Json(application))
}

#[axum::debug_handler]
pub async fn review_application(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, application_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReviewApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let application = state
        .job_service
        .review_application(id, application_id, user.id, payload.status, payload.notes)
        .await?;
    Ok(Json(application))
}

#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let items = state.job_service.list_applications(id, user.id).await?;
    Ok(Json(ApplicationListResponse { items }))
}

#[axum::debug_handler]
pub async fn submit_bid(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BidPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let bid = state.job_service.bid(id, user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

#[axum::debug_handler]
pub async fn withdraw_bid(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, bid_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let bid = state.job_service.withdraw_bid(id, bid_id, user.id).await?;
    Ok(Json(bid))
}

#[axum::debug_handler]
pub async fn accept_bid(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, bid_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let (job, contract) = state.job_service.accept_bid(id, bid_id, user.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(AcceptBidResponse {
            job: JobResponse::for_viewer(job, Some(user.id), None, now()),
            contract_id: contract.id,
            contract_number: contract.contract_number,
        }),
    ))
}

#[axum::debug_handler]
pub async fn recommendations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let items = state.job_service.recommendations(user.id).await?;
    Ok(Json(JobListResponse { items }))
}

#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let items = state.job_service.my_applications(user.id).await?;
    Ok(Json(MyApplicationsResponse { items }))
}

#[axum::debug_handler]
pub async fn my_postings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let items = state.job_service.my_postings(user.id).await?;
    Ok(Json(JobListResponse { items }))
}
