//! Chaos loop: serial and parallel sequencing across targets

use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vm_chaos_common::{CommandPhase, FaultType, ScriptInput, SequenceMode, Target};

use super::events::{ChaosPhase, EventEmitter};
use super::probes::{ProbePhase, ProbeRunner};
use super::window::ChaosWindow;
use crate::error::OrchestrationError;
use crate::inspect::inspect;
use crate::remote::{CommandInvocation, RemoteCommandClient};

/// Result of a chaos loop that ran to the end of its window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub iterations: u64,
    pub elapsed: Duration,
}

/// Drives inject/wait/revert iterations until the chaos window expires.
pub struct SequenceExecutor<'a, C, P, E> {
    pub client: &'a C,
    pub probes: &'a P,
    pub events: &'a E,
    pub targets: &'a [Target],
    pub inject: &'a ScriptInput,
    pub revert: &'a ScriptInput,
    pub fault: FaultType,
    pub duration: Duration,
    pub interval: Duration,
    pub abort: &'a CancellationToken,
}

impl<C, P, E> SequenceExecutor<'_, C, P, E>
where
    C: RemoteCommandClient,
    P: ProbeRunner,
    E: EventEmitter,
{
    /// Run iterations while the window is open.
    ///
    /// The abort token is checked before every inject submission and ends
    /// the run with [`OrchestrationError::Aborted`].
    pub async fn run(&self, mode: SequenceMode) -> Result<RunSummary, OrchestrationError> {
        let window = ChaosWindow::start(self.duration);
        let mut iterations = 0;

        while !window.expired() {
            self.ensure_not_aborted()?;
            iterations += 1;
            info!(
                iteration = iterations,
                mode = %mode,
                targets = self.targets.len(),
                "[Chaos]: Starting {} iteration",
                self.fault
            );
            self.notify_injection();

            match mode {
                SequenceMode::Serial => self.serial_pass().await?,
                SequenceMode::Parallel => self.parallel_pass().await?,
            }
            debug!(elapsed_s = window.elapsed().as_secs_f64(), "[Chaos]: Iteration complete");
        }

        Ok(RunSummary {
            iterations,
            elapsed: window.elapsed(),
        })
    }

    /// One target at a time; the first failure ends the run.
    async fn serial_pass(&self) -> Result<(), OrchestrationError> {
        for target in self.targets {
            self.ensure_not_aborted()?;
            info!(target = %target, "[Chaos]: Injecting {} on target", self.fault);
            let invocation = self.submit(target, self.inject).await?;

            self.run_probes().await?;
            self.wait_interval().await;

            self.collect(invocation, CommandPhase::Inject).await?;

            info!(target = %target, "[Chaos]: Reverting {} on target", self.fault);
            let invocation = self.submit(target, self.revert).await?;
            self.collect(invocation, CommandPhase::Revert).await?;
        }
        Ok(())
    }

    /// All targets at once: fan-out inject, wait, fan-in, fan-out revert, fan-in.
    async fn parallel_pass(&self) -> Result<(), OrchestrationError> {
        self.ensure_not_aborted()?;
        info!(targets = self.targets.len(), "[Chaos]: Injecting {} on all targets", self.fault);
        let injects = self.submit_all(self.inject).await?;

        self.run_probes().await?;
        self.wait_interval().await;

        self.collect_all(injects, CommandPhase::Inject).await?;

        info!(targets = self.targets.len(), "[Chaos]: Reverting {} on all targets", self.fault);
        let reverts = self.submit_all(self.revert).await?;
        self.collect_all(reverts, CommandPhase::Revert).await
    }

    /// No inject is submitted once the abort token is set.
    fn ensure_not_aborted(&self) -> Result<(), OrchestrationError> {
        if self.abort.is_cancelled() {
            info!("[Chaos]: Abort requested, stopping chaos loop");
            return Err(OrchestrationError::Aborted);
        }
        Ok(())
    }

    async fn submit(
        &self,
        target: &Target,
        script: &ScriptInput,
    ) -> Result<CommandInvocation, OrchestrationError> {
        self.client
            .submit(target, script)
            .await
            .map_err(|e| OrchestrationError::remote(target, script.phase, &e))
    }

    async fn submit_all(
        &self,
        script: &ScriptInput,
    ) -> Result<Vec<CommandInvocation>, OrchestrationError> {
        futures::future::join_all(self.targets.iter().map(|t| self.submit(t, script)))
            .await
            .into_iter()
            .collect()
    }

    /// Await one invocation and turn its output into a verdict.
    async fn collect(
        &self,
        invocation: CommandInvocation,
        phase: CommandPhase,
    ) -> Result<(), OrchestrationError> {
        let target = invocation.target().clone();
        info!(target = %target, "[Wait]: Waiting for {phase} script completion");

        let raw = self
            .client
            .await_output(invocation)
            .await
            .map_err(|e| OrchestrationError::remote(&target, phase, &e))?;

        let result = inspect(&raw);
        result.log(&target);
        match result.error {
            Some(fragment) => Err(OrchestrationError::ScriptFailure {
                target,
                fault: self.fault,
                phase,
                fragment,
            }),
            None => Ok(()),
        }
    }

    /// Await every invocation in order, surfacing the first failure last.
    async fn collect_all(
        &self,
        invocations: Vec<CommandInvocation>,
        phase: CommandPhase,
    ) -> Result<(), OrchestrationError> {
        let mut first_failure = None;
        for invocation in invocations {
            if let Err(e) = self.collect(invocation, phase).await {
                if first_failure.is_none() {
                    first_failure = Some(e);
                } else {
                    error!("[Wait]: {e}");
                }
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    async fn run_probes(&self) -> Result<(), OrchestrationError> {
        debug!("[Probe]: Running probes during chaos");
        self.probes
            .run_probes(ProbePhase::DuringChaos)
            .await
            .map_err(|e| OrchestrationError::Probe(format!("{e:#}")))
    }

    async fn wait_interval(&self) {
        info!("[Wait]: Waiting for chaos interval of {}s", self.interval.as_secs());
        tokio::time::sleep(self.interval).await;
    }

    fn notify_injection(&self) {
        let message = format!("Injecting {} chaos on target instances", self.fault);
        if let Err(e) = self.events.notify(ChaosPhase::ChaosInject, &message) {
            warn!(error = %format!("{e:#}"), "Failed to emit chaos event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::events::MockEventEmitter;
    use crate::orchestrator::probes::NoProbes;
    use vm_chaos_common::{OperatingSystem, ParameterSet};

    /// Client whose commands always succeed immediately
    struct Succeeding;

    impl RemoteCommandClient for Succeeding {
        async fn submit(&self, target: &Target, _script: &ScriptInput) -> anyhow::Result<CommandInvocation> {
            Ok(CommandInvocation::new(target.clone(), "cmd"))
        }

        async fn await_output(&self, _invocation: CommandInvocation) -> anyhow::Result<String> {
            Ok("[stdout]\nok\n[stderr]\n".to_string())
        }
    }

    fn script(phase: CommandPhase) -> ScriptInput {
        ScriptInput::new(phase, OperatingSystem::Linux, vec![], ParameterSet::new())
    }

    #[tokio::test(start_paused = true)]
    async fn notifies_once_per_iteration_and_tolerates_event_failure() {
        let mut events = MockEventEmitter::new();
        events
            .expect_notify()
            .withf(|phase, message| {
                *phase == ChaosPhase::ChaosInject && message.contains("http-chaos")
            })
            .times(3)
            .returning(|_, _| Err(anyhow::anyhow!("events API unavailable")));

        let targets = [Target::Instance("vm-1".into())];
        let (inject, revert) = (script(CommandPhase::Inject), script(CommandPhase::Revert));
        let abort = CancellationToken::new();
        let executor = SequenceExecutor {
            client: &Succeeding,
            probes: &NoProbes,
            events: &events,
            targets: &targets,
            inject: &inject,
            revert: &revert,
            fault: FaultType::Http,
            duration: Duration::from_secs(30),
            interval: Duration::from_secs(10),
            abort: &abort,
        };

        let summary = executor.run(SequenceMode::Parallel).await.unwrap();
        assert_eq!(summary.iterations, 3);
        assert!(summary.elapsed >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_token_stops_before_first_iteration() {
        let mut events = MockEventEmitter::new();
        events.expect_notify().never();

        let targets = [Target::Instance("vm-1".into())];
        let (inject, revert) = (script(CommandPhase::Inject), script(CommandPhase::Revert));
        let abort = CancellationToken::new();
        abort.cancel();
        let executor = SequenceExecutor {
            client: &Succeeding,
            probes: &NoProbes,
            events: &events,
            targets: &targets,
            inject: &inject,
            revert: &revert,
            fault: FaultType::Stress,
            duration: Duration::from_secs(30),
            interval: Duration::from_secs(10),
            abort: &abort,
        };

        assert!(matches!(
            executor.run(SequenceMode::Serial).await,
            Err(OrchestrationError::Aborted)
        ));
    }
}
