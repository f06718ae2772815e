pub mod auth;
pub mod campaign;
pub mod cli;
pub mod config;
pub mod data_paths;
pub mod logging;
pub mod report;
pub mod tradier;

// Re-export the reconciliation entry point at the root level
pub use campaign::{run_audit, AccountSnapshot};
