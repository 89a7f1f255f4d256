//! stress-ng based resource stressors

use serde::Serialize;
use tracing::{info, warn};

use super::{FaultConfig, FaultError};
use crate::defaults;
use crate::script::ParameterSet;

/// Resource a stress fault exhausts
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Stressor {
    #[default]
    CpuHog,
    MemoryHog,
    IoStress,
}

#[derive(Debug, Clone, Serialize)]
pub struct StressFaultConfig {
    pub stressor: Stressor,
    pub cpu_cores: u32,
    pub workers: u32,
    /// Memory per worker in MB
    pub memory_mb: u64,
    /// Share of the filesystem to fill, 0 when unset
    pub fs_utilization_percentage: u32,
    /// Absolute amount to fill in GB, 0 when unset
    pub fs_utilization_gb: u64,
    pub volume_mount_path: Option<String>,
}

impl Default for StressFaultConfig {
    fn default() -> Self {
        Self {
            stressor: Stressor::default(),
            cpu_cores: defaults::DEFAULT_CPU_CORES,
            workers: defaults::DEFAULT_NUMBER_OF_WORKERS,
            memory_mb: defaults::DEFAULT_MEMORY_CONSUMPTION_MB,
            fs_utilization_percentage: 0,
            fs_utilization_gb: 0,
            volume_mount_path: None,
        }
    }
}

impl StressFaultConfig {
    /// `--hdd-bytes` value. A percentage takes precedence over an absolute size.
    fn hdd_bytes(&self) -> String {
        match (self.fs_utilization_percentage, self.fs_utilization_gb) {
            (0, 0) => {
                info!(
                    "Neither filesystem utilisation percentage nor bytes provided, using {}",
                    defaults::DEFAULT_FILESYSTEM_UTILIZATION
                );
                defaults::DEFAULT_FILESYSTEM_UTILIZATION.to_string()
            }
            (0, gb) => format!("{gb}G"),
            (pct, 0) => format!("{pct}%"),
            (pct, _) => {
                warn!("Both filesystem utilisation percentage and bytes provided, using the percentage");
                format!("{pct}%")
            }
        }
    }

    /// The `(StressArgs, AdditionalArgs)` pair, unquoted
    pub fn stress_args(&self) -> (String, String) {
        match self.stressor {
            Stressor::CpuHog => (format!("--cpu {}", self.cpu_cores), String::new()),
            Stressor::MemoryHog => (
                format!("--vm {} --vm-bytes {}M", self.workers, self.memory_mb),
                String::new(),
            ),
            Stressor::IoStress => {
                let mut args = format!(
                    "--io {w} --hdd {w} --hdd-bytes {}",
                    self.hdd_bytes(),
                    w = self.workers
                );
                if let Some(path) = self.volume_mount_path.as_deref().filter(|p| !p.is_empty()) {
                    args.push_str(" --temp-path ");
                    args.push_str(path);
                }
                let additional = if self.cpu_cores != 0 {
                    format!("--cpu {}", self.cpu_cores)
                } else {
                    String::new()
                };
                (args, additional)
            }
        }
    }
}

fn quoted(s: &str) -> String {
    format!("\"{s}\"")
}

pub(super) fn inject_parameters(config: &FaultConfig) -> Result<ParameterSet, FaultError> {
    let stress = &config.stress;
    let (args, additional) = stress.stress_args();

    info!(
        stressor = %stress.stressor,
        args = %args,
        additional = %additional,
        timeout = config.chaos_duration_secs,
        "[Info]: Details of stressor"
    );

    Ok(ParameterSet::new()
        .with("InstallDependency", config.install_flag())
        .with("Duration", config.chaos_duration_secs.to_string())
        .with("ExperimentName", stress.stressor.as_ref())
        .with("StressArgs", quoted(&args))
        .with("AdditionalArgs", quoted(&additional)))
}

pub(super) fn revert_parameters(config: &FaultConfig) -> Result<ParameterSet, FaultError> {
    Ok(ParameterSet::new().with("ExperimentName", config.stress.stressor.as_ref()))
}
