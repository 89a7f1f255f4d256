//! Orchestration error types

use thiserror::Error;
use vm_chaos_common::{CommandPhase, FaultError, FaultType, ScriptError, Target, TargetError};

/// Errors that end a chaos run
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Target list is empty or malformed
    #[error("invalid target list: {0}")]
    Validation(#[from] TargetError),

    /// A configuration value is missing or not supported
    #[error("invalid {field}: '{value}'")]
    Configuration { field: &'static str, value: String },

    /// Parameters or scripts could not be prepared
    #[error("failed to prepare fault injection: {0}")]
    Preparation(String),

    /// Submitting or awaiting a remote command failed
    #[error("{phase} command on {target} failed: {message}")]
    RemoteExecution {
        target: Target,
        phase: CommandPhase,
        message: String,
    },

    /// The remote script ran and reported an error
    #[error("{fault} {phase} script failed on {target}: {fragment}")]
    ScriptFailure {
        target: Target,
        fault: FaultType,
        phase: CommandPhase,
        fragment: String,
    },

    /// A health probe failed while the fault was active
    #[error("probe failed during chaos: {0}")]
    Probe(String),

    /// The abort watcher task ended abnormally
    #[error("abort watcher failed: {0}")]
    WatcherFailed(String),

    /// The run was stopped by the abort signal
    #[error("chaos run aborted")]
    Aborted,
}

impl OrchestrationError {
    pub(crate) fn remote(target: &Target, phase: CommandPhase, err: &anyhow::Error) -> Self {
        Self::RemoteExecution {
            target: target.clone(),
            phase,
            message: format!("{err:#}"),
        }
    }
}

impl From<ScriptError> for OrchestrationError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::MissingPath { phase } => Self::Configuration {
                field: match phase {
                    CommandPhase::Inject => "SCRIPT_PATH",
                    CommandPhase::Revert => "ABORT_SCRIPT_PATH",
                },
                value: String::new(),
            },
            err @ ScriptError::Io { .. } => Self::Preparation(err.to_string()),
        }
    }
}

impl From<FaultError> for OrchestrationError {
    fn from(err: FaultError) -> Self {
        match err {
            FaultError::Unsupported { field, value } => Self::Configuration { field, value },
            err @ FaultError::Empty { .. } => Self::Preparation(err.to_string()),
        }
    }
}
