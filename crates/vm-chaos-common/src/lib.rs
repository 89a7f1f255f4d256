//! vm-chaos-common - Shared types for fault injection
//!
//! This crate holds the cloud-agnostic vocabulary of a chaos run: which
//! instances are targeted, which fault is injected, and how the inject and
//! revert scripts are parameterised. It has no AWS SDK dependencies.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`fault`]: Fault types and their parameter-building strategies
//! - [`script`]: Script documents, parameters and loaded script inputs
//! - [`sequence`]: Serial/parallel sequence mode
//! - [`target`]: Target instance identifiers

pub mod defaults;
pub mod fault;
pub mod script;
pub mod sequence;
pub mod target;

// Re-export commonly used types
pub use fault::{FaultConfig, FaultError, FaultType, ParameterBuilder};
pub use script::{CommandPhase, OperatingSystem, Parameter, ParameterSet, ScriptError, ScriptInput};
pub use sequence::SequenceMode;
pub use target::{Target, TargetError, parse_targets};
