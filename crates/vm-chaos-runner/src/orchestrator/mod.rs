//! Fault-injection orchestration
//!
//! [`Orchestrator::prepare_fault_injection`] validates the run, prepares the
//! inject and revert scripts, then races the chaos loop against the abort
//! watcher:
//!
//! ```text
//! ramp ─► spawn AbortWatcher ─► SequenceExecutor ─► ramp ─► Completed
//!              │
//!              └──── abort token fires ─► drop executor, revert all ─► Aborted
//! ```

pub mod abort;
pub mod events;
pub mod probes;
pub mod results;
pub mod sequence;
pub mod window;

use std::sync::Arc;
use std::time::Duration;

pub use abort::{AbortReport, AbortWatcher, RevertStatus, TargetRevert};
pub use events::{ChaosPhase, EventEmitter, LogEmitter};
pub use probes::{NoProbes, ProbePhase, ProbeRunner};
pub use sequence::{RunSummary, SequenceExecutor};
pub use window::ChaosWindow;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vm_chaos_common::{CommandPhase, ScriptInput, Target, TargetError};

use crate::config::ChaosSpec;
use crate::error::OrchestrationError;
use crate::remote::RemoteCommandClient;

/// How a chaos run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChaosOutcome {
    /// The chaos window closed normally
    Completed(RunSummary),
    /// The abort token fired and the watcher ran its revert pass
    Aborted(AbortReport),
}

/// Parameterised inject and revert scripts for a run
#[derive(Debug, Clone)]
pub struct PreparedScripts {
    pub inject: ScriptInput,
    pub revert: ScriptInput,
}

/// Build the fault parameters and load both scripts.
pub fn prepare_scripts(spec: &ChaosSpec) -> Result<PreparedScripts, OrchestrationError> {
    let inject_params = spec.fault.inject_parameters()?;
    let revert_params = spec.fault.revert_parameters()?;

    let inject = ScriptInput::load(
        CommandPhase::Inject,
        spec.scripts.os,
        &spec.scripts.inject_path,
        inject_params,
    )?;
    let revert = ScriptInput::load(
        CommandPhase::Revert,
        spec.scripts.os,
        &spec.scripts.revert_path,
        revert_params,
    )?;

    Ok(PreparedScripts { inject, revert })
}

/// Runs a chaos experiment against remote targets.
pub struct Orchestrator<C, P = NoProbes, E = LogEmitter> {
    client: Arc<C>,
    probes: P,
    events: E,
}

impl<C, P, E> Orchestrator<C, P, E>
where
    C: RemoteCommandClient + 'static,
    P: ProbeRunner,
    E: EventEmitter,
{
    pub fn new(client: Arc<C>, probes: P, events: E) -> Self {
        Self {
            client,
            probes,
            events,
        }
    }

    /// Validate, prepare and run the experiment described by `spec`.
    ///
    /// Returns [`ChaosOutcome::Aborted`] once the watcher has reverted every
    /// target after `abort` fired. Deciding how the process exits is left to
    /// the caller.
    pub async fn prepare_fault_injection(
        &self,
        spec: &ChaosSpec,
        abort: CancellationToken,
    ) -> Result<ChaosOutcome, OrchestrationError> {
        if spec.targets.targets.is_empty() {
            return Err(OrchestrationError::Validation(TargetError::Empty));
        }

        let PreparedScripts { inject, revert } = prepare_scripts(spec)?;
        let revert = Arc::new(revert);
        let targets: Arc<[Target]> = spec.targets.targets.clone().into();

        info!(
            experiment = %spec.experiment_name,
            fault = %spec.fault.fault_type,
            sequence = %spec.sequence,
            targets = targets.len(),
            "[Chaos]: Preparing fault injection"
        );

        if !ramp_wait(spec.timing.ramp_time, "before injecting chaos", Some(&abort)).await {
            warn!("[Abort]: Aborted during ramp time, no chaos was injected");
            self.notify_aborted();
            return Ok(ChaosOutcome::Aborted(AbortReport::default()));
        }

        let watcher = AbortWatcher::new(
            Arc::clone(&self.client),
            Arc::clone(&targets),
            Arc::clone(&revert),
            abort.clone(),
        );
        let watcher = tokio::spawn(watcher.watch());

        let executor = SequenceExecutor {
            client: self.client.as_ref(),
            probes: &self.probes,
            events: &self.events,
            targets: &targets,
            inject: &inject,
            revert: &revert,
            fault: spec.fault.fault_type,
            duration: spec.timing.duration,
            interval: spec.timing.interval,
            abort: &abort,
        };
        let chaos = async {
            let summary = executor.run(spec.sequence).await?;
            ramp_wait(spec.timing.ramp_time, "after injecting chaos", None).await;
            Ok::<_, OrchestrationError>(summary)
        };

        // Once the token fires no further chaos is issued; the watcher owns the run.
        let result = tokio::select! {
            biased;
            _ = abort.cancelled() => Err(OrchestrationError::Aborted),
            result = chaos => result,
        };

        if abort.is_cancelled() {
            match &result {
                Ok(_) | Err(OrchestrationError::Aborted) => {}
                Err(e) => warn!(error = %e, "[Abort]: Chaos loop failed after abort was requested"),
            }
            return self.await_watcher(watcher).await;
        }

        watcher.abort();
        let summary = result?;
        info!(
            iterations = summary.iterations,
            elapsed_s = summary.elapsed.as_secs(),
            "[Chaos]: Fault injection completed"
        );
        Ok(ChaosOutcome::Completed(summary))
    }

    async fn await_watcher(
        &self,
        watcher: JoinHandle<AbortReport>,
    ) -> Result<ChaosOutcome, OrchestrationError> {
        let report = watcher
            .await
            .map_err(|e| OrchestrationError::WatcherFailed(e.to_string()))?;
        self.notify_aborted();
        Ok(ChaosOutcome::Aborted(report))
    }

    fn notify_aborted(&self) {
        if let Err(e) = self
            .events
            .notify(ChaosPhase::ChaosAborted, "Chaos aborted, targets reverted")
        {
            warn!(error = %format!("{e:#}"), "Failed to emit chaos event");
        }
    }
}

/// Sleep for the ramp time. Returns false if `abort` fired first.
async fn ramp_wait(ramp: Duration, when: &str, abort: Option<&CancellationToken>) -> bool {
    if ramp.is_zero() {
        return true;
    }
    info!("[Ramp]: Waiting for the {}s ramp time {when}", ramp.as_secs());
    tokio::select! {
        _ = tokio::time::sleep(ramp) => true,
        _ = async {
            match abort {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        } => false,
    }
}
