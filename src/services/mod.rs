pub mod generator;
pub mod job_store;
pub mod orchestrator;
pub mod redactor;
