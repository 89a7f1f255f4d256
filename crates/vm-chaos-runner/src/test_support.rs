use std::time::Duration;

use vm_chaos_common::{FaultConfig, FaultType, OperatingSystem, SequenceMode, Target};
use vm_chaos_common::fault::{HttpFaultConfig, StressFaultConfig};

use crate::config::{ChaosSpec, ScriptConfig, TargetConfig, TimingConfig};

/// A parallel http-chaos spec over plain instance targets
pub(crate) fn chaos_spec(targets: &[&str]) -> ChaosSpec {
    ChaosSpec {
        timing: TimingConfig {
            duration: Duration::from_secs(10),
            interval: Duration::from_secs(5),
            ramp_time: Duration::ZERO,
        },
        targets: TargetConfig {
            targets: targets.iter().map(|t| Target::Instance(t.to_string())).collect(),
            scale_set: false,
        },
        fault: FaultConfig {
            fault_type: FaultType::Http,
            install_dependency: false,
            chaos_duration_secs: 10,
            http: HttpFaultConfig::default(),
            stress: StressFaultConfig::default(),
        },
        scripts: ScriptConfig {
            os: OperatingSystem::Linux,
            inject_path: String::new(),
            revert_path: String::new(),
        },
        sequence: SequenceMode::Parallel,
        experiment_name: "vm-http-chaos".to_string(),
        engine_name: None,
    }
}
