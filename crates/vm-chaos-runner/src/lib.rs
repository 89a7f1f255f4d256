//! vm-chaos-runner - fault injection for remote virtual machines
//!
//! Submits inject and revert scripts to instances through AWS Systems
//! Manager Run Command, sequencing them serially or in parallel for a bounded
//! chaos window, and reverts every target when the run is aborted.

pub mod aws;
pub mod config;
pub mod error;
pub mod inspect;
pub mod orchestrator;
pub mod remote;
pub mod signal;
pub mod wait;

#[cfg(test)]
mod test_support;

pub use error::OrchestrationError;
pub use orchestrator::{ChaosOutcome, Orchestrator};

/// Process exit code after an abort-triggered revert pass (128 + SIGINT)
pub const ABORT_EXIT_CODE: i32 = 130;
