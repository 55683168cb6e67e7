use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::contract_dto::{
        ContractListResponse, ContractResponse, ContractStatusPayload, CreateContractPayload,
        DisputePayload, DisputeUpdatePayload, FundEscrowPayload, MessagePayload, MilestonePayload,
        MilestoneUpdatePayload,
    },
    error::Result,
    middleware::auth::AuthUser,
    models::contract::Contract,
    utils::time::now,
    AppState,
};

fn respond(contract: Contract) -> Json<ContractResponse> {
    Json(ContractResponse::build(contract, now()))
}

#[axum::debug_handler]
pub async fn create_contract(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateContractPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let contract = state.contract_service.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, respond(contract)))
}

#[axum::debug_handler]
pub async fn list_contracts(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse> {
    let current = now();
    let items = state
        .contract_service
        .list_for(user.id)
        .await?
        .into_iter()
        .map(|contract| ContractResponse::build(contract, current))
        .collect();
    Ok(Json(ContractListResponse { items }))
}

#[axum::debug_handler]
pub async fn get_contract(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let contract = state.contract_service.get(id, user.id).await?;
    Ok(respond(contract))
}

#[axum::debug_handler]
pub async fn sign_contract(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let contract = state.contract_service.sign(id, user.id).await?;
    Ok(respond(contract))
}

#[axum::debug_handler]
pub async fn add_milestone(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MilestonePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let contract = state
        .contract_service
        .add_milestone(id, user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, respond(contract)))
}

#[axum::debug_handler]
pub async fn update_milestone(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, milestone_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MilestoneUpdatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let contract = state
        .contract_service
        .update_milestone(id, milestone_id, user.id, payload.status, payload.reason)
        .await?;
    Ok(respond(contract))
}

#[axum::debug_handler]
pub async fn fund_escrow(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<FundEscrowPayload>,
) -> Result<impl IntoResponse> {
    let contract = state
        .contract_service
        .fund_escrow(id, user.id, payload.amount)
        .await?;
    Ok(respond(contract))
}

#[axum::debug_handler]
pub async fn raise_dispute(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DisputePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let contract = state
        .contract_service
        .raise_dispute(id, user.id, payload.reason, payload.milestone_id)
        .await?;
    Ok((StatusCode::CREATED, respond(contract)))
}

#[axum::debug_handler]
pub async fn update_dispute(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, dispute_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<DisputeUpdatePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let contract = state
        .contract_service
        .update_dispute(id, dispute_id, user.id, payload.status, payload.resolution)
        .await?;
    Ok(respond(contract))
}

#[axum::debug_handler]
pub async fn post_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let contract = state
        .contract_service
        .post_message(id, user.id, payload.message)
        .await?;
    Ok((StatusCode::CREATED, respond(contract)))
}

#[axum::debug_handler]
pub async fn change_contract_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ContractStatusPayload>,
) -> Result<impl IntoResponse> {
    let contract = state
        .contract_service
        .change_status(id, user.id, payload.status)
        .await?;
    Ok(respond(contract))
}
