pub mod contract_dto;
pub mod job_dto;
pub mod profile_dto;
