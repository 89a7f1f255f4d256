//! Chaos event notifications
//!
//! Events are advisory: a failed notification is logged by the caller and
//! never stops the run.

use anyhow::Result;
use tracing::{debug, info};

/// Lifecycle point an event reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
pub enum ChaosPhase {
    /// A chaos iteration is starting
    ChaosInject,
    /// The run was aborted and targets were reverted
    ChaosAborted,
}

/// Sink for chaos lifecycle events
#[cfg_attr(test, mockall::automock)]
pub trait EventEmitter: Send + Sync {
    fn notify(&self, phase: ChaosPhase, message: &str) -> Result<()>;
}

/// Emits events as structured log lines tagged with the chaos engine.
///
/// Silent when no engine name is configured.
#[derive(Debug, Clone, Default)]
pub struct LogEmitter {
    engine_name: Option<String>,
    experiment_name: String,
}

impl LogEmitter {
    pub fn new(engine_name: Option<String>, experiment_name: impl Into<String>) -> Self {
        Self {
            engine_name: engine_name.filter(|n| !n.is_empty()),
            experiment_name: experiment_name.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.engine_name.is_some()
    }
}

impl EventEmitter for LogEmitter {
    fn notify(&self, phase: ChaosPhase, message: &str) -> Result<()> {
        let Some(engine) = &self.engine_name else {
            debug!(reason = %phase, "No chaos engine configured, skipping event");
            return Ok(());
        };
        info!(
            engine = %engine,
            experiment = %self.experiment_name,
            reason = %phase,
            "[Event] {message}"
        );
        Ok(())
    }
}
