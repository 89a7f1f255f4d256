//! Script inputs submitted to targets
//!
//! A [`ScriptInput`] is the fully prepared payload of one remote command:
//! the script body, the operating system it is written for, and the named
//! parameters the script reads.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

/// Script loading errors
#[derive(Debug, Error)]
pub enum ScriptError {
    /// No path configured for a required script
    #[error("no {phase} script provided")]
    MissingPath { phase: CommandPhase },

    /// Script file could not be read
    #[error("failed to read {phase} script '{path}': {source}")]
    Io {
        phase: CommandPhase,
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which half of the fault a remote command performs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CommandPhase {
    /// Apply the fault
    Inject,
    /// Remove a previously applied fault
    Revert,
}

/// Operating system of the targets, selecting the script interpreter
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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    /// Shell script
    #[default]
    Linux,
    /// PowerShell script
    Windows,
}

/// A named script parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// Ordered set of script parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterSet(Vec<Parameter>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter, keeping insertion order
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(Parameter {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Look up a parameter value by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A prepared remote command: script body plus parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptInput {
    pub phase: CommandPhase,
    pub os: OperatingSystem,
    pub lines: Vec<String>,
    pub parameters: ParameterSet,
}

impl ScriptInput {
    pub fn new(
        phase: CommandPhase,
        os: OperatingSystem,
        lines: Vec<String>,
        parameters: ParameterSet,
    ) -> Self {
        Self {
            phase,
            os,
            lines,
            parameters,
        }
    }

    /// Read a script file and bind it to its parameters.
    pub fn load(
        phase: CommandPhase,
        os: OperatingSystem,
        path: &str,
        parameters: ParameterSet,
    ) -> Result<Self, ScriptError> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ScriptError::MissingPath { phase });
        }

        let body = std::fs::read_to_string(Path::new(path)).map_err(|source| ScriptError::Io {
            phase,
            path: path.to_string(),
            source,
        })?;

        Ok(Self::new(
            phase,
            os,
            body.lines().map(str::to_string).collect(),
            parameters,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_set_keeps_order() {
        let params = ParameterSet::new()
            .with("ToxicName", "upstream_chaos")
            .with("ListenPort", "20000");
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["ToxicName", "ListenPort"]);
        assert_eq!(params.get("ListenPort"), Some("20000"));
        assert_eq!(params.get("Missing"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn operating_system_parses() {
        assert_eq!("linux".parse::<OperatingSystem>().unwrap(), OperatingSystem::Linux);
        assert_eq!("Windows".parse::<OperatingSystem>().unwrap(), OperatingSystem::Windows);
        assert!("plan9".parse::<OperatingSystem>().is_err());
    }

    #[test]
    fn missing_path_is_rejected() {
        let err = ScriptInput::load(
            CommandPhase::Revert,
            OperatingSystem::Linux,
            "   ",
            ParameterSet::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ScriptError::MissingPath {
                phase: CommandPhase::Revert
            }
        ));
        assert_eq!(err.to_string(), "no revert script provided");
    }

    #[test]
    fn unreadable_path_reports_io_error() {
        let err = ScriptInput::load(
            CommandPhase::Inject,
            OperatingSystem::Linux,
            "/definitely/not/here/inject.sh",
            ParameterSet::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here/inject.sh"));
    }

    #[test]
    fn loads_script_lines_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inject.ps1");
        std::fs::write(&path, "Write-Output $env:ToxicName\r\nexit 0\n").unwrap();

        let params = ParameterSet::new().with("ToxicName", "downstream_chaos");
        let script = ScriptInput::load(
            CommandPhase::Inject,
            OperatingSystem::Windows,
            &format!("  {}  ", path.display()),
            params.clone(),
        )
        .unwrap();

        assert_eq!(script.lines, ["Write-Output $env:ToxicName", "exit 0"]);
        assert_eq!(script.os, OperatingSystem::Windows);
        assert_eq!(script.parameters, params);
    }

    #[test]
    fn serializes_parameters_as_list() {
        let params = ParameterSet::new().with("ExperimentName", "cpu-hog");
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json[0]["name"], "ExperimentName");
        assert_eq!(json[0]["value"], "cpu-hog");
    }
}
