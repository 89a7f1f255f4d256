//! Abort watcher
//!
//! Waits on the abort token for the whole run. Once the token is cancelled it
//! reverts every target, best effort: failures are logged and recorded in the
//! [`AbortReport`], never propagated.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vm_chaos_common::{CommandPhase, ScriptInput, Target};

use crate::inspect::inspect;
use crate::remote::{CommandInvocation, RemoteCommandClient};

/// Outcome of reverting one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RevertStatus {
    Reverted,
    SubmitFailed { message: String },
    AwaitFailed { message: String },
    ScriptFailed { fragment: String },
}

impl RevertStatus {
    pub fn is_reverted(&self) -> bool {
        matches!(self, RevertStatus::Reverted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetRevert {
    pub target: Target,
    #[serde(flatten)]
    pub status: RevertStatus,
}

/// Per-target result of an abort-triggered revert pass, in target order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AbortReport {
    pub reverts: Vec<TargetRevert>,
}

impl AbortReport {
    pub fn all_reverted(&self) -> bool {
        self.reverts.iter().all(|r| r.status.is_reverted())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TargetRevert> {
        self.reverts.iter().filter(|r| !r.status.is_reverted())
    }
}

/// Reverts every target once the abort token fires.
pub struct AbortWatcher<C> {
    client: Arc<C>,
    targets: Arc<[Target]>,
    revert: Arc<ScriptInput>,
    token: CancellationToken,
}

impl<C: RemoteCommandClient> AbortWatcher<C> {
    pub fn new(
        client: Arc<C>,
        targets: Arc<[Target]>,
        revert: Arc<ScriptInput>,
        token: CancellationToken,
    ) -> Self {
        Self {
            client,
            targets,
            revert,
            token,
        }
    }

    /// Suspend until aborted, then run the revert pass.
    pub async fn watch(self) -> AbortReport {
        self.token.cancelled().await;
        warn!(
            targets = self.targets.len(),
            "[Abort]: Chaos abort signal received, reverting chaos on all targets"
        );
        self.revert_all().await
    }

    /// Submit the revert to every target, then await each in target order.
    ///
    /// Always completes; safe to run more than once.
    pub async fn revert_all(&self) -> AbortReport {
        let mut submitted: Vec<Result<CommandInvocation, RevertStatus>> =
            Vec::with_capacity(self.targets.len());

        for target in self.targets.iter() {
            match self.client.submit(target, &self.revert).await {
                Ok(invocation) => submitted.push(Ok(invocation)),
                Err(e) => {
                    error!(target = %target, error = %format!("{e:#}"), "[Abort]: Failed to submit revert");
                    submitted.push(Err(RevertStatus::SubmitFailed {
                        message: format!("{e:#}"),
                    }));
                }
            }
        }

        let mut reverts = Vec::with_capacity(submitted.len());
        for (target, entry) in self.targets.iter().zip(submitted) {
            let status = match entry {
                Ok(invocation) => self.await_revert(target, invocation).await,
                Err(status) => status,
            };
            reverts.push(TargetRevert {
                target: target.clone(),
                status,
            });
        }

        let report = AbortReport { reverts };
        if report.all_reverted() {
            info!("[Abort]: Chaos reverted on all targets");
        } else {
            warn!(
                failed = report.failed().count(),
                "[Abort]: Chaos revert incomplete, manual cleanup may be needed"
            );
        }
        report
    }

    async fn await_revert(&self, target: &Target, invocation: CommandInvocation) -> RevertStatus {
        info!(target = %target, "[Abort]: Waiting for revert script completion");
        match self.client.await_output(invocation).await {
            Ok(raw) => {
                let result = inspect(&raw);
                result.log(target);
                match result.error {
                    Some(fragment) => {
                        error!(
                            target = %target,
                            phase = %CommandPhase::Revert,
                            "[Abort]: Revert script failed: {fragment}"
                        );
                        RevertStatus::ScriptFailed { fragment }
                    }
                    None => RevertStatus::Reverted,
                }
            }
            Err(e) => {
                error!(target = %target, error = %format!("{e:#}"), "[Abort]: Failed to get revert result");
                RevertStatus::AwaitFailed {
                    message: format!("{e:#}"),
                }
            }
        }
    }
}
