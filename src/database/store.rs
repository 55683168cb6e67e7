use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::filter::{CategoryCount, JobFilter, JobPage, Page};
use crate::error::Result;
use crate::models::contract::Contract;
use crate::models::job::Job;
use crate::models::profile::CandidateProfile;

/// A change applied to a locked job. Returning an error aborts the write.
pub type JobMutation = Box<dyn FnOnce(&mut Job) -> Result<()> + Send>;

/// A change applied to a locked contract. Returning an error aborts the write.
pub type ContractMutation = Box<dyn FnOnce(&mut Contract) -> Result<()> + Send>;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, job: &Job) -> Result<()>;

    /// Loads a job with its applications and bids.
    async fn find_job(&self, id: Uuid) -> Result<Option<Job>>;

    /// Runs `mutation` against the job under an exclusive lock and persists
    /// the result, including new or changed applications and bids.
    async fn update_job_with(&self, id: Uuid, mutation: JobMutation) -> Result<Job>;

    async fn record_view(&self, id: Uuid) -> Result<()>;

    async fn search_jobs(&self, filter: &JobFilter, page: &Page, now: DateTime<Utc>)
        -> Result<JobPage>;

    async fn category_breakdown(
        &self,
        filter: &JobFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<CategoryCount>>;

    async fn jobs_posted_by(&self, user: Uuid) -> Result<Vec<Job>>;

    async fn jobs_applied_to_by(&self, user: Uuid) -> Result<Vec<Job>>;

    /// Accepts a bid and creates its contract in one transaction. The
    /// contract is built from the job and bid after the acceptance has been
    /// applied.
    async fn accept_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Job, Contract)>;
}

#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn insert_contract(&self, contract: &Contract) -> Result<()>;

    async fn find_contract(&self, id: Uuid) -> Result<Option<Contract>>;

    async fn contracts_for(&self, user: Uuid) -> Result<Vec<Contract>>;

    async fn update_contract_with(&self, id: Uuid, mutation: ContractMutation) -> Result<Contract>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_profile(&self, user: Uuid) -> Result<Option<CandidateProfile>>;

    async fn upsert_profile(&self, profile: &CandidateProfile) -> Result<CandidateProfile>;
}
