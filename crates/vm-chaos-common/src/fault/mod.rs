//! Fault types and their parameter-building strategies
//!
//! Every [`FaultType`] maps to a [`ParameterBuilder`] through an exhaustive
//! match, so adding a fault type without a builder does not compile.

pub mod http;
pub mod stress;

pub use http::{HttpFaultConfig, HttpToxic, parse_toxics};
pub use stress::{StressFaultConfig, Stressor};

use serde::Serialize;
use thiserror::Error;

use crate::script::ParameterSet;

/// Fault configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FaultError {
    /// A required list or value is empty
    #[error("no {field} provided")]
    Empty { field: &'static str },

    /// A value names something this tool cannot inject
    #[error("unsupported {field}: '{value}'")]
    Unsupported { field: &'static str, value: String },
}

/// Category of disruption injected into the targets
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum FaultType {
    /// Network toxics (latency, timeout, rate limit, data limit) through a local proxy
    #[strum(serialize = "http-chaos")]
    #[serde(rename = "http-chaos")]
    Http,
    /// Resource stress (CPU, memory, IO) via stress-ng
    #[strum(serialize = "stress-chaos")]
    #[serde(rename = "stress-chaos")]
    Stress,
}

/// Signature of a parameter-building function
pub type BuildFn = fn(&FaultConfig) -> Result<ParameterSet, FaultError>;

/// Inject and revert parameter builders for one fault type
#[derive(Clone, Copy)]
pub struct ParameterBuilder {
    pub inject: BuildFn,
    pub revert: BuildFn,
}

impl std::fmt::Debug for ParameterBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterBuilder").finish_non_exhaustive()
    }
}

impl FaultType {
    /// The parameter-building strategy for this fault type
    pub const fn parameter_builder(self) -> ParameterBuilder {
        match self {
            Self::Http => ParameterBuilder {
                inject: http::inject_parameters,
                revert: http::revert_parameters,
            },
            Self::Stress => ParameterBuilder {
                inject: stress::inject_parameters,
                revert: stress::revert_parameters,
            },
        }
    }
}

/// Fault selection plus the parameters of every fault type
#[derive(Debug, Clone, Serialize)]
pub struct FaultConfig {
    pub fault_type: FaultType,
    /// Ask the script to install its dependencies (proxy, stress-ng) first
    pub install_dependency: bool,
    /// Total chaos duration, passed to stressors as their own timeout
    pub chaos_duration_secs: u64,
    pub http: HttpFaultConfig,
    pub stress: StressFaultConfig,
}

impl FaultConfig {
    /// Build the parameters passed to the inject script
    pub fn inject_parameters(&self) -> Result<ParameterSet, FaultError> {
        (self.fault_type.parameter_builder().inject)(self)
    }

    /// Build the parameters passed to the revert script
    pub fn revert_parameters(&self) -> Result<ParameterSet, FaultError> {
        (self.fault_type.parameter_builder().revert)(self)
    }

    /// Value of the `InstallDependency` parameter
    pub(crate) fn install_flag(&self) -> &'static str {
        if self.install_dependency {
            "True"
        } else {
            "False"
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config(fault_type: FaultType) -> FaultConfig {
    FaultConfig {
        fault_type,
        install_dependency: true,
        chaos_duration_secs: 60,
        http: HttpFaultConfig::default(),
        stress: StressFaultConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_type_parses() {
        assert_eq!("http-chaos".parse::<FaultType>().unwrap(), FaultType::Http);
        assert_eq!("STRESS-CHAOS".parse::<FaultType>().unwrap(), FaultType::Stress);
        assert!("disk-fill".parse::<FaultType>().is_err());
        assert_eq!(FaultType::Http.to_string(), "http-chaos");
    }

    #[test]
    fn dispatches_to_fault_specific_builder() {
        let http = test_config(FaultType::Http);
        assert!(http.inject_parameters().unwrap().get("ToxicName").is_some());
        assert!(http.revert_parameters().unwrap().get("ToxicName").is_some());

        let stress = test_config(FaultType::Stress);
        assert!(stress.inject_parameters().unwrap().get("StressArgs").is_some());
        assert_eq!(
            stress.revert_parameters().unwrap().get("ExperimentName"),
            Some("cpu-hog")
        );
    }

    #[test]
    fn install_flag_renders_as_title_case() {
        let mut config = test_config(FaultType::Http);
        assert_eq!(config.install_flag(), "True");
        config.install_dependency = false;
        assert_eq!(config.install_flag(), "False");
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = FaultError::Unsupported {
            field: "HTTP_CHAOS_TYPE",
            value: "jitter".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported HTTP_CHAOS_TYPE: 'jitter'");
    }
}
