//! Shared fixtures for orchestration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use vm_chaos_common::fault::{HttpFaultConfig, StressFaultConfig};
use vm_chaos_common::{
    CommandPhase, FaultConfig, FaultType, OperatingSystem, ScriptInput, SequenceMode, Target,
};
use vm_chaos_runner::config::{ChaosSpec, ScriptConfig, TargetConfig, TimingConfig};
use vm_chaos_runner::remote::{CommandInvocation, RemoteCommandClient};

pub const OK_OUTPUT: &str = "Enable succeeded: \n[stdout]\nok\n[stderr]\n\n";

pub fn failed_output(fragment: &str) -> String {
    format!("Enable succeeded: \n[stdout]\n[stderr]\n{fragment}\n")
}

/// One recorded client call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Submit(CommandPhase, String),
    Await(CommandPhase, String),
}

pub fn submit(phase: CommandPhase, target: &str) -> Call {
    Call::Submit(phase, target.to_string())
}

pub fn await_(phase: CommandPhase, target: &str) -> Call {
    Call::Await(phase, target.to_string())
}

/// In-memory `RemoteCommandClient` that records every call.
///
/// Commands succeed instantly unless an output or failure is configured for
/// the `(phase, target)` pair.
#[derive(Default)]
pub struct FakeRemote {
    calls: Mutex<Vec<Call>>,
    outputs: Mutex<HashMap<(CommandPhase, String), String>>,
    submit_failures: Mutex<HashSet<(CommandPhase, String)>>,
    abort_on_submit: Mutex<Option<(CommandPhase, String, CancellationToken)>>,
    latency: Duration,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `raw` when awaiting `phase` on `target`
    pub fn with_output(self, phase: CommandPhase, target: &str, raw: impl Into<String>) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .insert((phase, target.to_string()), raw.into());
        self
    }

    /// Fail submission of `phase` to `target`
    pub fn with_submit_failure(self, phase: CommandPhase, target: &str) -> Self {
        self.submit_failures
            .lock()
            .unwrap()
            .insert((phase, target.to_string()));
        self
    }

    /// Cancel `token` when `phase` is submitted to `target`
    pub fn abort_on_submit(self, phase: CommandPhase, target: &str, token: CancellationToken) -> Self {
        *self.abort_on_submit.lock().unwrap() = Some((phase, target.to_string(), token));
        self
    }

    /// Make every command take `latency` to complete
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Targets `phase` was submitted to, in call order
    pub fn submitted(&self, phase: CommandPhase) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Submit(p, t) if p == phase => Some(t),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn phase_of(handle: &str) -> CommandPhase {
    if handle.starts_with("revert") {
        CommandPhase::Revert
    } else {
        CommandPhase::Inject
    }
}

impl RemoteCommandClient for FakeRemote {
    async fn submit(&self, target: &Target, script: &ScriptInput) -> anyhow::Result<CommandInvocation> {
        let name = target.to_string();
        self.record(Call::Submit(script.phase, name.clone()));

        if let Some((phase, t, token)) = self.abort_on_submit.lock().unwrap().as_ref() {
            if *phase == script.phase && *t == name {
                token.cancel();
            }
        }

        if self
            .submit_failures
            .lock()
            .unwrap()
            .contains(&(script.phase, name.clone()))
        {
            anyhow::bail!("SendCommand throttled for {name}");
        }

        let n = self.calls.lock().unwrap().len();
        Ok(CommandInvocation::new(target.clone(), format!("{}-{n}", script.phase)))
    }

    async fn await_output(&self, invocation: CommandInvocation) -> anyhow::Result<String> {
        let phase = phase_of(invocation.handle());
        let name = invocation.target().to_string();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.record(Call::Await(phase, name.clone()));

        Ok(self
            .outputs
            .lock()
            .unwrap()
            .get(&(phase, name))
            .cloned()
            .unwrap_or_else(|| OK_OUTPUT.to_string()))
    }
}

/// Inject and revert scripts written to a temporary directory
pub struct Scripts {
    _dir: TempDir,
    pub inject: String,
    pub revert: String,
}

pub fn scripts() -> Scripts {
    let dir = tempfile::tempdir().unwrap();
    let inject = dir.path().join("inject.sh");
    let revert = dir.path().join("revert.sh");
    std::fs::write(&inject, "#!/bin/bash\necho \"injecting $ToxicName\"\n").unwrap();
    std::fs::write(&revert, "#!/bin/bash\necho \"reverting $ToxicName\"\n").unwrap();
    Scripts {
        inject: inject.to_string_lossy().into_owned(),
        revert: revert.to_string_lossy().into_owned(),
        _dir: dir,
    }
}

/// An http-chaos spec over plain instance targets
pub fn chaos_spec(
    targets: &[&str],
    sequence: SequenceMode,
    duration_secs: u64,
    interval_secs: u64,
    scripts: &Scripts,
) -> ChaosSpec {
    ChaosSpec {
        timing: TimingConfig {
            duration: Duration::from_secs(duration_secs),
            interval: Duration::from_secs(interval_secs),
            ramp_time: Duration::ZERO,
        },
        targets: TargetConfig {
            targets: targets.iter().map(|t| Target::Instance(t.to_string())).collect(),
            scale_set: false,
        },
        fault: FaultConfig {
            fault_type: FaultType::Http,
            install_dependency: false,
            chaos_duration_secs: duration_secs,
            http: HttpFaultConfig::default(),
            stress: StressFaultConfig::default(),
        },
        scripts: ScriptConfig {
            os: OperatingSystem::Linux,
            inject_path: scripts.inject.clone(),
            revert_path: scripts.revert.clone(),
        },
        sequence,
        experiment_name: "vm-http-chaos".to_string(),
        engine_name: None,
    }
}
