#[macro_use]
mod macros;

pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::database::{ContractStore, JobStore, MemoryStore, ProfileStore};
use crate::middleware::auth::AuthKeys;
use crate::middleware::rate_limit::RateLimiter;
use crate::services::{
    contract_service::ContractService, job_service::JobService, profile_service::ProfileService,
};

#[derive(Clone)]
pub struct AppState {
    pub job_service: JobService,
    pub contract_service: ContractService,
    pub profile_service: ProfileService,
    pub auth: AuthKeys,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        contracts: Arc<dyn ContractStore>,
        profiles: Arc<dyn ProfileStore>,
        config: &Config,
    ) -> Self {
        Self {
            job_service: JobService::new(jobs.clone(), profiles.clone(), config.recommendation_limit),
            contract_service: ContractService::new(contracts, jobs),
            profile_service: ProfileService::new(profiles),
            auth: AuthKeys::new(&config.jwt_secret),
            limiter: RateLimiter::new(config.public_rps, config.api_rps),
        }
    }

    /// State backed by a single process-local store.
    pub fn in_memory(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(store.clone(), store.clone(), store, config)
    }
}
