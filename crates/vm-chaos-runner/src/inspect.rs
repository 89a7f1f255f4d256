//! Remote command output parsing
//!
//! Run Command output is a single text blob in which the lines `[stdout]` and
//! `[stderr]` open the two output sections. A command is judged failed when
//! the first line of its stderr section is non-empty.

use serde::Serialize;
use tracing::{error, info};
use vm_chaos_common::Target;

const STDOUT_MARKER: &str = "[stdout]";
const STDERR_MARKER: &str = "[stderr]";

/// Parsed output of one remote command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    /// Stderr fragment explaining the failure, present iff the command failed
    pub error: Option<String>,
}

impl CommandResult {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// Log the captured output of `target`, skipping blank lines.
    pub fn log(&self, target: &Target) {
        for line in self.stdout.iter().filter(|l| !l.trim().is_empty()) {
            info!(target = %target, "[stdout] {line}");
        }
        for line in self.stderr.iter().filter(|l| !l.trim().is_empty()) {
            error!(target = %target, "[stderr] {line}");
        }
    }
}

#[derive(Clone, Copy)]
enum Section {
    Preamble,
    Stdout,
    Stderr,
}

/// Split raw command output into sections and derive the verdict.
///
/// Never fails: output without markers is a success with empty sections.
pub fn inspect(raw: &str) -> CommandResult {
    let mut result = CommandResult::default();
    let mut section = Section::Preamble;

    for line in raw.lines() {
        match line {
            STDOUT_MARKER => section = Section::Stdout,
            STDERR_MARKER => section = Section::Stderr,
            _ => match section {
                Section::Preamble => {}
                Section::Stdout => result.stdout.push(line.to_string()),
                Section::Stderr => result.stderr.push(line.to_string()),
            },
        }
    }

    result.error = match result.stderr.first() {
        Some(first) if !first.is_empty() => Some(result.stderr.join("\n")),
        _ => None,
    };
    result
}
