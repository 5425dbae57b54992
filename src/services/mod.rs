pub mod access;
pub mod korapay;
pub mod orchestrator;
pub mod transaction_store;
