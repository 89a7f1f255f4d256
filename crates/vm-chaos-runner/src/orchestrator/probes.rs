//! Health probe seam

use std::future::Future;

use anyhow::Result;

/// When a probe batch runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ProbePhase {
    /// While the fault is injected
    DuringChaos,
}

/// Runs health probes against the system under test.
pub trait ProbeRunner: Send + Sync {
    fn run_probes(&self, phase: ProbePhase) -> impl Future<Output = Result<()>> + Send;
}

/// Probe runner with no probes configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProbes;

impl ProbeRunner for NoProbes {
    async fn run_probes(&self, _phase: ProbePhase) -> Result<()> {
        Ok(())
    }
}
