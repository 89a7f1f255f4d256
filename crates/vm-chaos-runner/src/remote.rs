//! Remote command execution seam
//!
//! The orchestrator only talks to targets through [`RemoteCommandClient`],
//! so the sequencing logic can be exercised without a cloud account.

use std::future::Future;

use anyhow::Result;
use vm_chaos_common::{ScriptInput, Target};

/// A submitted remote command bound to one target.
///
/// Not `Clone`: awaiting the output consumes the invocation, so a job is
/// awaited at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandInvocation {
    target: Target,
    handle: String,
}

impl CommandInvocation {
    pub fn new(target: Target, handle: impl Into<String>) -> Self {
        Self {
            target,
            handle: handle.into(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Opaque control-plane handle (the SSM command id)
    pub fn handle(&self) -> &str {
        &self.handle
    }
}

/// Submits scripts to targets and collects their raw output.
pub trait RemoteCommandClient: Send + Sync {
    /// Start `script` on `target` without waiting for it to finish
    fn submit(
        &self,
        target: &Target,
        script: &ScriptInput,
    ) -> impl Future<Output = Result<CommandInvocation>> + Send;

    /// Wait for a submitted command and return its raw output
    fn await_output(&self, invocation: CommandInvocation) -> impl Future<Output = Result<String>> + Send;
}
