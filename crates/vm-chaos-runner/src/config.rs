//! Configuration types for the runner

use std::time::Duration;

use serde::Serialize;
use vm_chaos_common::{FaultConfig, OperatingSystem, SequenceMode, Target};

/// Chaos window timing
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimingConfig {
    /// Total time the chaos loop keeps starting iterations
    pub duration: Duration,
    /// Time a fault stays injected before it is checked and reverted
    pub interval: Duration,
    /// Wait before the first injection and after the last revert
    pub ramp_time: Duration,
}

impl TimingConfig {
    /// Iterations a parallel run performs, assuming instant remote commands
    pub fn expected_iterations(&self) -> u64 {
        let interval = self.interval.as_millis().max(1);
        self.duration.as_millis().div_ceil(interval) as u64
    }
}

/// Targets of the run
#[derive(Debug, Clone, Serialize)]
pub struct TargetConfig {
    /// Targets in processing order
    pub targets: Vec<Target>,
    /// Whether target names are `<scale-set>_<instance>` composites
    pub scale_set: bool,
}

/// Inject and revert scripts
#[derive(Debug, Clone, Serialize)]
pub struct ScriptConfig {
    pub os: OperatingSystem,
    pub inject_path: String,
    pub revert_path: String,
}

/// Immutable description of one chaos run
#[derive(Debug, Clone, Serialize)]
pub struct ChaosSpec {
    pub timing: TimingConfig,
    pub targets: TargetConfig,
    pub fault: FaultConfig,
    pub scripts: ScriptConfig,
    pub sequence: SequenceMode,
    pub experiment_name: String,
    /// Chaos engine to report events against, if any
    pub engine_name: Option<String>,
}

/// AWS connection settings
#[derive(Debug, Clone)]
pub struct AwsConfig {
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
    /// Upper bound on waiting for a single remote command
    pub command_timeout: Duration,
}

/// Runtime behavior flags
#[derive(Debug, Clone)]
pub struct RuntimeFlags {
    /// Print the plan without contacting AWS
    pub dry_run: bool,
    /// Output JSON file path
    pub output: Option<String>,
}

/// Configuration for a `run` invocation
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub chaos: ChaosSpec,
    pub aws: AwsConfig,
    pub flags: RuntimeFlags,
}

impl RunConfig {
    pub fn region(&self) -> &str {
        &self.aws.region
    }
    pub fn aws_profile(&self) -> Option<&str> {
        self.aws.aws_profile.as_deref()
    }
    pub fn dry_run(&self) -> bool {
        self.flags.dry_run
    }
    pub fn output(&self) -> Option<&str> {
        self.flags.output.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(duration: u64, interval: u64) -> TimingConfig {
        TimingConfig {
            duration: Duration::from_secs(duration),
            interval: Duration::from_secs(interval),
            ramp_time: Duration::ZERO,
        }
    }

    #[test]
    fn expected_iterations_rounds_up() {
        assert_eq!(timing(10, 5).expected_iterations(), 2);
        assert_eq!(timing(11, 5).expected_iterations(), 3);
        assert_eq!(timing(30, 30).expected_iterations(), 1);
        assert_eq!(timing(0, 30).expected_iterations(), 0);
    }
}
