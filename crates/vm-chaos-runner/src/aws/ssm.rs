//! Run Command client backed by AWS Systems Manager

use anyhow::{Context, Result};
use aws_sdk_ssm::error::ProvideErrorMetadata;
use aws_sdk_ssm::types::{CommandInvocationStatus, InstanceInformationStringFilter, PingStatus};
use tracing::{debug, info, warn};
use vm_chaos_common::{OperatingSystem, ParameterSet, ScriptInput, Target};

use super::AwsContext;
use super::error::{classify_anyhow_error, classify_ssm_error};
use crate::remote::{CommandInvocation, RemoteCommandClient};
use crate::wait::{WaitConfig, poll_until};

/// Submits scripts as `AWS-RunShellScript` / `AWS-RunPowerShellScript` commands.
#[derive(Debug, Clone)]
pub struct SsmRunCommandClient {
    client: aws_sdk_ssm::Client,
    wait: WaitConfig,
    run_id: String,
}

impl SsmRunCommandClient {
    pub fn new(aws: &AwsContext, wait: WaitConfig, run_id: impl Into<String>) -> Self {
        Self {
            client: aws.ssm_client(),
            wait,
            run_id: run_id.into(),
        }
    }

    /// Check that every target is a managed instance with an online agent.
    pub async fn ensure_managed(&self, targets: &[Target]) -> Result<()> {
        for target in targets {
            let filter = InstanceInformationStringFilter::builder()
                .key("InstanceIds")
                .values(target.instance_id())
                .build()
                .context("Failed to build instance information filter")?;

            let output = self
                .client
                .describe_instance_information()
                .filters(filter)
                .send()
                .await
                .with_context(|| format!("Failed to describe SSM instance {target}"))?;

            let info = output
                .instance_information_list()
                .first()
                .with_context(|| format!("{target} is not a managed SSM instance"))?;

            match info.ping_status() {
                Some(PingStatus::Online) => {
                    debug!(target = %target, "SSM agent online");
                }
                status => {
                    anyhow::bail!("SSM agent on {target} is not online (status: {status:?})");
                }
            }
        }
        info!(targets = targets.len(), "All targets are managed SSM instances");
        Ok(())
    }
}

fn document_name(os: OperatingSystem) -> &'static str {
    match os {
        OperatingSystem::Linux => "AWS-RunShellScript",
        OperatingSystem::Windows => "AWS-RunPowerShellScript",
    }
}

/// Expose `parameters` to the script as environment variables.
fn parameter_preamble(os: OperatingSystem, parameters: &ParameterSet) -> Vec<String> {
    parameters
        .iter()
        .map(|p| match os {
            OperatingSystem::Linux => {
                format!("export {}='{}'", p.name, p.value.replace('\'', r"'\''"))
            }
            OperatingSystem::Windows => {
                format!("$env:{} = '{}'", p.name, p.value.replace('\'', "''"))
            }
        })
        .collect()
}

/// Render a finished invocation in the `[stdout]` / `[stderr]` section format.
fn compose_output(
    status: &CommandInvocationStatus,
    response_code: i32,
    stdout: &str,
    stderr: &str,
) -> String {
    let stdout = stdout.trim_end_matches('\n');
    let mut stderr = stderr.trim_end_matches('\n').to_string();
    if *status == CommandInvocationStatus::Failed && stderr.trim().is_empty() {
        stderr = format!("error: command exited with status {response_code}");
    }
    format!("Status: {}\n[stdout]\n{stdout}\n[stderr]\n{stderr}\n", status.as_str())
}

impl RemoteCommandClient for SsmRunCommandClient {
    async fn submit(&self, target: &Target, script: &ScriptInput) -> Result<CommandInvocation> {
        let mut commands = parameter_preamble(script.os, &script.parameters);
        commands.extend(script.lines.iter().cloned());

        let result = self
            .client
            .send_command()
            .document_name(document_name(script.os))
            .instance_ids(target.instance_id())
            .comment(format!("vm-chaos {} {}", self.run_id, script.phase))
            .parameters("commands", commands)
            .parameters(
                "executionTimeout",
                vec![self.wait.timeout.as_secs().to_string()],
            )
            .send()
            .await
            .with_context(|| format!("SendCommand failed for {target}"));

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                if let Some(hint) = classify_anyhow_error(&e).suggestion() {
                    warn!(target = %target, "{hint}");
                }
                return Err(e);
            }
        };

        let command_id = output
            .command()
            .and_then(|c| c.command_id())
            .with_context(|| format!("No command id returned for {target}"))?;

        debug!(target = %target, command_id, phase = %script.phase, "Command submitted");
        Ok(CommandInvocation::new(target.clone(), command_id))
    }

    async fn await_output(&self, invocation: CommandInvocation) -> Result<String> {
        let client = &self.client;
        let target = invocation.target();
        let command_id = invocation.handle();
        let label = format!("command {command_id} on {target}");
        let name = label.as_str();

        poll_until(
            &self.wait,
            None,
            || async move {
                let output = match client
                    .get_command_invocation()
                    .command_id(command_id)
                    .instance_id(target.instance_id())
                    .send()
                    .await
                {
                    Ok(output) => output,
                    Err(e) => {
                        let kind = classify_ssm_error(e.code(), e.message());
                        if kind.is_retryable() {
                            return Ok(None);
                        }
                        return Err(anyhow::Error::new(e)
                            .context(format!("GetCommandInvocation failed for {target}")));
                    }
                };

                let Some(status) = output.status() else {
                    return Ok(None);
                };
                match status {
                    CommandInvocationStatus::Success | CommandInvocationStatus::Failed => {
                        Ok(Some(compose_output(
                            status,
                            output.response_code(),
                            output.standard_output_content().unwrap_or_default(),
                            output.standard_error_content().unwrap_or_default(),
                        )))
                    }
                    CommandInvocationStatus::Cancelled | CommandInvocationStatus::TimedOut => {
                        Err(anyhow::anyhow!(
                            "{name} ended with status {}: {}",
                            status.as_str(),
                            output.status_details().unwrap_or_default()
                        ))
                    }
                    _ => Ok(None),
                }
            },
            name,
        )
        .await
    }
}
