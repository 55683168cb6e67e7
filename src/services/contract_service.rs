use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::database::{ContractStore, JobStore};
use crate::dto::contract_dto::{CreateContractPayload, MilestonePayload};
use crate::error::{Error, Result};
use crate::models::contract::{Contract, ContractStatus, DisputeStatus, MilestoneStatus};
use crate::utils::time::now;

#[derive(Clone)]
pub struct ContractService {
    contracts: Arc<dyn ContractStore>,
    jobs: Arc<dyn JobStore>,
}

impl ContractService {
    pub fn new(contracts: Arc<dyn ContractStore>, jobs: Arc<dyn JobStore>) -> Self {
        Self { contracts, jobs }
    }

    /// Drafts a contract. A referenced job must exist and belong to the client.
    #[instrument(skip(self, payload))]
    pub async fn create(&self, client: Uuid, payload: CreateContractPayload) -> Result<Contract> {
        if let Some(job_id) = payload.job_id {
            let job = self
                .jobs
                .find_job(job_id)
                .await?
                .ok_or_else(|| Error::NotFound("Job not found".into()))?;
            job.require_owner(client)?;
        }
        let contract = Contract::new(payload.into_new_contract(client)?, now())?;
        self.contracts.insert_contract(&contract).await?;
        info!(
            contract_id = %contract.id,
            contract_number = %contract.contract_number,
            user_id = %client,
            "Contract drafted"
        );
        Ok(contract)
    }

    /// Loads a contract on behalf of one of its parties.
    pub async fn get(&self, id: Uuid, actor: Uuid) -> Result<Contract> {
        let contract = self
            .contracts
            .find_contract(id)
            .await?
            .ok_or_else(|| Error::NotFound("Contract not found".into()))?;
        contract.require_party(actor)?;
        Ok(contract)
    }

    pub async fn list_for(&self, user: Uuid) -> Result<Vec<Contract>> {
        self.contracts.contracts_for(user).await
    }

    #[instrument(skip(self))]
    pub async fn sign(&self, id: Uuid, actor: Uuid) -> Result<Contract> {
        let contract = self
            .contracts
            .update_contract_with(id, Box::new(move |c: &mut Contract| c.sign(actor, now())))
            .await?;
        info!(contract_id = %id, user_id = %actor, status = %contract.status, "Contract signed");
        Ok(contract)
    }

    #[instrument(skip(self, payload))]
    pub async fn add_milestone(
        &self,
        id: Uuid,
        actor: Uuid,
        payload: MilestonePayload,
    ) -> Result<Contract> {
        let contract = self
            .contracts
            .update_contract_with(
                id,
                Box::new(move |c: &mut Contract| {
                    c.add_milestone(actor, payload.into(), now()).map(|_| ())
                }),
            )
            .await?;
        info!(contract_id = %id, user_id = %actor, "Milestone added");
        Ok(contract)
    }

    #[instrument(skip(self, reason))]
    pub async fn update_milestone(
        &self,
        id: Uuid,
        milestone_id: Uuid,
        actor: Uuid,
        next: MilestoneStatus,
        reason: Option<String>,
    ) -> Result<Contract> {
        let contract = self
            .contracts
            .update_contract_with(
                id,
                Box::new(move |c: &mut Contract| {
                    c.update_milestone(actor, milestone_id, next, reason, now())
                }),
            )
            .await?;
        info!(
            contract_id = %id,
            milestone_id = %milestone_id,
            status = %next,
            total_paid = %contract.get_total_paid(),
            "Milestone updated"
        );
        Ok(contract)
    }

    #[instrument(skip(self))]
    pub async fn fund_escrow(&self, id: Uuid, actor: Uuid, amount: Decimal) -> Result<Contract> {
        let contract = self
            .contracts
            .update_contract_with(
                id,
                Box::new(move |c: &mut Contract| c.fund_escrow(actor, amount, now())),
            )
            .await?;
        info!(contract_id = %id, amount = %amount, held = %contract.escrow.total_held, "Escrow funded");
        Ok(contract)
    }

    #[instrument(skip(self, reason))]
    pub async fn raise_dispute(
        &self,
        id: Uuid,
        actor: Uuid,
        reason: String,
        milestone: Option<Uuid>,
    ) -> Result<Contract> {
        let contract = self
            .contracts
            .update_contract_with(
                id,
                Box::new(move |c: &mut Contract| {
                    c.raise_dispute(actor, reason, milestone, now()).map(|_| ())
                }),
            )
            .await?;
        info!(contract_id = %id, user_id = %actor, "Dispute raised");
        Ok(contract)
    }

    #[instrument(skip(self, resolution))]
    pub async fn update_dispute(
        &self,
        id: Uuid,
        dispute_id: Uuid,
        actor: Uuid,
        next: DisputeStatus,
        resolution: Option<String>,
    ) -> Result<Contract> {
        let contract = self
            .contracts
            .update_contract_with(
                id,
                Box::new(move |c: &mut Contract| {
                    c.update_dispute(actor, dispute_id, next, resolution, now())
                }),
            )
            .await?;
        info!(contract_id = %id, dispute_id = %dispute_id, status = %next, "Dispute updated");
        Ok(contract)
    }

    #[instrument(skip(self, message))]
    pub async fn post_message(&self, id: Uuid, actor: Uuid, message: String) -> Result<Contract> {
        let contract = self
            .contracts
            .update_contract_with(
                id,
                Box::new(move |c: &mut Contract| c.post_message(actor, message, now()).map(|_| ())),
            )
            .await?;
        info!(
            contract_id = %id,
            user_id = %actor,
            messages = contract.communications.len(),
            "Contract message posted"
        );
        Ok(contract)
    }

    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        id: Uuid,
        actor: Uuid,
        next: ContractStatus,
    ) -> Result<Contract> {
        let contract = self
            .contracts
            .update_contract_with(
                id,
                Box::new(move |c: &mut Contract| c.transition_to(actor, next, now())),
            )
            .await?;
        info!(contract_id = %id, user_id = %actor, status = %next, "Contract status changed");
        Ok(contract)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{JobStore, MemoryStore};
    use crate::models::contract::{ContractScope, ContractType, PaymentStructure};

    fn service_over(store: Arc<MemoryStore>) -> ContractService {
        ContractService::new(store.clone(), store)
    }

    fn payload(professional: Uuid) -> CreateContractPayload {
        CreateContractPayload {
            job_id: None,
            professional_id: professional,
            title: "Lookbook styling".into(),
            contract_type: ContractType::FixedTerm,
            scope: ContractScope::default(),
            total_amount: Decimal::from(1000),
            currency: "EUR".into(),
            payment_structure: PaymentStructure::Milestone,
            escrow_enabled: false,
        }
    }

    #[tokio::test]
    async fn strangers_cannot_read_or_sign() {
        let service = service_over(Arc::new(MemoryStore::new()));
        let client = Uuid::new_v4();
        let contract = service.create(client, payload(Uuid::new_v4())).await.unwrap();

        let stranger = Uuid::new_v4();
        assert!(matches!(
            service.get(contract.id, stranger).await.unwrap_err(),
            Error::Forbidden(_)
        ));
        assert!(matches!(
            service.sign(contract.id, stranger).await.unwrap_err(),
            Error::Forbidden(_)
        ));
        assert_eq!(service.get(contract.id, client).await.unwrap().status, ContractStatus::Draft);
    }

    #[tokio::test]
    async fn referenced_job_must_exist_and_belong_to_the_client() {
        let store = Arc::new(MemoryStore::new());
        let service = service_over(store.clone());
        let client = Uuid::new_v4();
        let job = crate::models::job::tests::sample_job(client, now());
        store.insert_job(&job).await.unwrap();

        let missing = CreateContractPayload {
            job_id: Some(Uuid::new_v4()),
            ..payload(Uuid::new_v4())
        };
        assert!(matches!(
            service.create(client, missing).await.unwrap_err(),
            Error::NotFound(_)
        ));

        let foreign = CreateContractPayload {
            job_id: Some(job.id),
            ..payload(client)
        };
        assert!(matches!(
            service.create(Uuid::new_v4(), foreign).await.unwrap_err(),
            Error::Forbidden(_)
        ));
        assert!(store.contracts_for(client).await.unwrap().is_empty());

        let linked = CreateContractPayload {
            job_id: Some(job.id),
            ..payload(Uuid::new_v4())
        };
        let contract = service.create(client, linked).await.unwrap();
        assert_eq!(contract.job, Some(job.id));
    }

    #[tokio::test]
    async fn parties_exchange_messages() {
        let service = service_over(Arc::new(MemoryStore::new()));
        let client = Uuid::new_v4();
        let professional = Uuid::new_v4();
        let contract = service.create(client, payload(professional)).await.unwrap();

        service.post_message(contract.id, client, "Moodboard attached".into()).await.unwrap();
        let updated = service
            .post_message(contract.id, professional, "Looks good".into())
            .await
            .unwrap();
        assert_eq!(updated.communications.len(), 2);
        assert_eq!(updated.communications[1].author, professional);

        assert!(matches!(
            service
                .post_message(contract.id, Uuid::new_v4(), "hello".into())
                .await
                .unwrap_err(),
            Error::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn ledger_follows_milestone_payments() {
        let service = service_over(Arc::new(MemoryStore::new()));
        let client = Uuid::new_v4();
        let professional = Uuid::new_v4();
        let contract = service.create(client, payload(professional)).await.unwrap();
        service.sign(contract.id, client).await.unwrap();
        let active = service.sign(contract.id, professional).await.unwrap();
        assert_eq!(active.status, ContractStatus::Active);

        let with_milestone = service
            .add_milestone(
                contract.id,
                client,
                MilestonePayload {
                    title: "Fittings".into(),
                    description: None,
                    amount: Decimal::from(400),
                    due_date: None,
                },
            )
            .await
            .unwrap();
        let milestone_id = with_milestone.financial.milestones[0].id;

        service
            .update_milestone(contract.id, milestone_id, professional, MilestoneStatus::Due, None)
            .await
            .unwrap();
        let err = service
            .update_milestone(contract.id, milestone_id, professional, MilestoneStatus::Paid, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let paid = service
            .update_milestone(contract.id, milestone_id, client, MilestoneStatus::Paid, None)
            .await
            .unwrap();
        assert_eq!(paid.get_total_paid(), Decimal::from(400));
        assert_eq!(paid.get_remaining_amount(), Decimal::from(600));
    }
}
