use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::contract::{
    Contract, ContractScope, ContractStatus, ContractType, DisputeStatus, MilestoneStatus,
    NewContract, NewMilestone, PaymentStructure,
};
use crate::models::job::default_currency;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateContractPayload {
    pub job_id: Option<Uuid>,
    pub professional_id: Uuid,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub contract_type: ContractType,
    #[serde(default)]
    pub scope: ContractScope,
    pub total_amount: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_structure: PaymentStructure,
    #[serde(default)]
    pub escrow_enabled: bool,
}

impl CreateContractPayload {
    pub fn into_new_contract(self, client: Uuid) -> Result<NewContract> {
        if self.total_amount <= Decimal::ZERO {
            return Err(Error::BadRequest("Total amount must be positive".into()));
        }
        Ok(NewContract {
            job: self.job_id,
            client,
            professional: self.professional_id,
            title: self.title,
            contract_type: self.contract_type,
            scope: self.scope,
            total_amount: self.total_amount,
            currency: self.currency,
            payment_structure: self.payment_structure,
            escrow_enabled: self.escrow_enabled,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MilestonePayload {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<MilestonePayload> for NewMilestone {
    fn from(payload: MilestonePayload) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            amount: payload.amount,
            due_date: payload.due_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MilestoneUpdatePayload {
    pub status: MilestoneStatus,
    /// Required when disputing.
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundEscrowPayload {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DisputePayload {
    #[validate(length(min = 1, max = 2000, message = "Reason is required"))]
    pub reason: String,
    pub milestone_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DisputeUpdatePayload {
    pub status: DisputeStatus,
    #[validate(length(max = 2000))]
    pub resolution: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MessagePayload {
    #[validate(length(min = 1, max = 5000, message = "Message content cannot be empty"))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractStatusPayload {
    pub status: ContractStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractResponse {
    #[serde(flatten)]
    pub contract: Contract,
    pub total_paid: Decimal,
    pub remaining_amount: Decimal,
    pub fully_signed: bool,
    pub overdue: bool,
}

impl ContractResponse {
    pub fn build(contract: Contract, now: DateTime<Utc>) -> Self {
        Self {
            total_paid: contract.get_total_paid(),
            remaining_amount: contract.get_remaining_amount(),
            fully_signed: contract.is_fully_signed(),
            overdue: contract.is_overdue(now),
            contract,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractListResponse {
    pub items: Vec<ContractResponse>,
}
