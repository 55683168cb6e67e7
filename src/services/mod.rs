pub mod contract_service;
pub mod job_service;
pub mod matching_service;
pub mod profile_service;
