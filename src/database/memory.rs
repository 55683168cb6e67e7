use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::filter::{CategoryCount, JobFilter, JobPage, Page};
use crate::database::store::{
    ContractMutation, ContractStore, JobMutation, JobStore, ProfileStore,
};
use crate::error::{Error, Result};
use crate::models::contract::Contract;
use crate::models::job::{ApplicationStatus, Job};
use crate::models::profile::CandidateProfile;

#[derive(Default)]
struct State {
    jobs: HashMap<Uuid, Job>,
    contracts: HashMap<Uuid, Contract>,
    profiles: HashMap<Uuid, CandidateProfile>,
}

/// Process-local store behind a single lock, so every mutation (including
/// bid acceptance plus contract creation) is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn job_not_found() -> Error {
    Error::NotFound("Job not found".into())
}

fn contract_not_found() -> Error {
    Error::NotFound("Contract not found".into())
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn insert_job(&self, job: &Job) -> Result<()> {
        job.check_invariants()?;
        let mut state = self.state.write().await;
        if state.jobs.contains_key(&job.id) {
            return Err(Error::Conflict("Job already exists".into()));
        }
        state.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn find_job(&self, id: Uuid) -> Result<Option<Job>> {
        Ok(self.state.read().await.jobs.get(&id).cloned())
    }

    async fn update_job_with(&self, id: Uuid, mutation: JobMutation) -> Result<Job> {
        let mut state = self.state.write().await;
        let mut job = state.jobs.get(&id).cloned().ok_or_else(job_not_found)?;
        mutation(&mut job)?;
        job.check_invariants()?;
        state.jobs.insert(id, job.clone());
        Ok(job)
    }

    async fn record_view(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let job = state.jobs.get_mut(&id).ok_or_else(job_not_found)?;
        job.views += 1;
        Ok(())
    }

    async fn search_jobs(
        &self,
        filter: &JobFilter,
        page: &Page,
        now: DateTime<Utc>,
    ) -> Result<JobPage> {
        let state = self.state.read().await;
        let mut matching: Vec<&Job> = state
            .jobs
            .values()
            .filter(|job| filter.matches(job, now))
            .collect();
        matching.sort_by(|a, b| page.sort.compare(a, b));
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset().max(0) as usize)
            .take(page.per_page.max(0) as usize)
            .cloned()
            .collect();
        Ok(JobPage { items, total })
    }

    async fn category_breakdown(
        &self,
        filter: &JobFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<CategoryCount>> {
        let state = self.state.read().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for job in state.jobs.values().filter(|job| filter.matches(job, now)) {
            *counts.entry(job.category.as_str()).or_default() += 1;
        }
        let mut breakdown: Vec<CategoryCount> = counts
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect();
        breakdown.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));
        Ok(breakdown)
    }

    async fn jobs_posted_by(&self, user: Uuid) -> Result<Vec<Job>> {
        let state = self.state.read().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|job| job.posted_by == user)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn jobs_applied_to_by(&self, user: Uuid) -> Result<Vec<Job>> {
        let state = self.state.read().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|job| {
                job.applications.iter().any(|a| {
                    a.applicant == user && a.status != ApplicationStatus::Withdrawn
                })
            })
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn accept_bid(
        &self,
        job_id: Uuid,
        bid_id: Uuid,
        actor: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(Job, Contract)> {
        let mut state = self.state.write().await;
        let mut job = state.jobs.get(&job_id).cloned().ok_or_else(job_not_found)?;
        let bid = job.accept_bid(bid_id, actor, now)?;
        job.check_invariants()?;
        let contract = Contract::from_accepted_bid(&job, &bid, now);
        if state.contracts.values().any(|c| c.bid == Some(bid_id)) {
            return Err(Error::Conflict("A contract already exists for this bid".into()));
        }
        state.contracts.insert(contract.id, contract.clone());
        state.jobs.insert(job_id, job.clone());
        Ok((job, contract))
    }
}

#[async_trait]
impl ContractStore for MemoryStore {
    async fn insert_contract(&self, contract: &Contract) -> Result<()> {
        let mut state = self.state.write().await;
        let duplicate = state.contracts.values().any(|existing| {
            existing.id == contract.id || existing.contract_number == contract.contract_number
        });
        if duplicate {
            return Err(Error::Conflict("Contract already exists".into()));
        }
        state.contracts.insert(contract.id, contract.clone());
        Ok(())
    }

    async fn find_contract(&self, id: Uuid) -> Result<Option<Contract>> {
        Ok(self.state.read().await.contracts.get(&id).cloned())
    }

    async fn contracts_for(&self, user: Uuid) -> Result<Vec<Contract>> {
        let state = self.state.read().await;
        let mut contracts: Vec<Contract> = state
            .contracts
            .values()
            .filter(|c| c.client == user || c.professional == user)
            .cloned()
            .collect();
        contracts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contracts)
    }

    async fn update_contract_with(&self, id: Uuid, mutation: ContractMutation) -> Result<Contract> {
        let mut state = self.state.write().await;
        let mut contract = state
            .contracts
            .get(&id)
            .cloned()
            .ok_or_else(contract_not_found)?;
        mutation(&mut contract)?;
        state.contracts.insert(id, contract.clone());
        Ok(contract)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile(&self, user: Uuid) -> Result<Option<CandidateProfile>> {
        Ok(self.state.read().await.profiles.get(&user).cloned())
    }

    async fn upsert_profile(&self, profile: &CandidateProfile) -> Result<CandidateProfile> {
        let mut state = self.state.write().await;
        state.profiles.insert(profile.user_id, profile.clone());
        Ok(profile.clone())
    }
}
