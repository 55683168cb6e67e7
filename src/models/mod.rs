pub mod contract;
pub mod job;
pub mod profile;
