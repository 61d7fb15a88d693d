pub mod audit_log;
pub mod docs_generator;
pub mod public_data;
pub mod record_store;
pub mod reporting;
pub mod seed;
pub mod workspace;
