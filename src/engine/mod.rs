//! Execution engine for ivanti-agent
//!
//! The engine orchestrates:
//! 1. Diffing - Observe the host and show what would change
//! 2. Confirming - Ask before mutating an interactive host
//! 3. Executing - Reconcile every resource and report the outcome

pub mod differ;
pub mod executor;

pub use executor::{RunOptions, RunReport, RunStatus, execute};
