//! vm-chaos-runner: inject transient faults into remote VMs via SSM Run Command

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use vm_chaos_common::defaults::*;
use vm_chaos_common::fault::{HttpFaultConfig, StressFaultConfig, Stressor, parse_toxics};
use vm_chaos_common::{FaultConfig, FaultType, OperatingSystem, SequenceMode, parse_targets};
use vm_chaos_runner::aws::{AwsContext, SsmRunCommandClient, classify_anyhow_error, get_current_account_id};
use vm_chaos_runner::config::{
    AwsConfig, ChaosSpec, RunConfig, RuntimeFlags, ScriptConfig, TargetConfig, TimingConfig,
};
use vm_chaos_runner::orchestrator::results::{print_plan, print_results_summary, write_results};
use vm_chaos_runner::orchestrator::{LogEmitter, NoProbes, prepare_scripts};
use vm_chaos_runner::signal::forward_shutdown_signals;
use vm_chaos_runner::wait::WaitConfig;
use vm_chaos_runner::{ABORT_EXIT_CODE, ChaosOutcome, OrchestrationError, Orchestrator, inspect};

#[derive(Parser, Debug)]
#[command(name = "vm-chaos-runner")]
#[command(about = "Transient fault injection for remote VMs via AWS Systems Manager")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for the run command (extracted to reduce enum size)
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Comma-separated target instance ids (or <scale-set>_<instance> names)
    #[arg(long, env = "INSTANCE_NAMES")]
    instance_names: String,

    /// Treat target names as scale-set members (enable/disable)
    #[arg(long, env = "SCALE_SET", default_value = "disable")]
    scale_set: String,

    /// Total chaos duration in seconds
    #[arg(long, env = "TOTAL_CHAOS_DURATION", default_value_t = DEFAULT_CHAOS_DURATION)]
    duration: u64,

    /// Seconds a fault stays injected per iteration
    #[arg(long, env = "CHAOS_INTERVAL", default_value_t = DEFAULT_CHAOS_INTERVAL)]
    interval: u64,

    /// Seconds to wait before and after the chaos loop
    #[arg(long, env = "RAMP_TIME", default_value_t = DEFAULT_RAMP_TIME)]
    ramp_time: u64,

    /// serial or parallel
    #[arg(long, env = "SEQUENCE", default_value = DEFAULT_SEQUENCE)]
    sequence: String,

    /// http-chaos or stress-chaos
    #[arg(long, env = "FAULT_TYPE", default_value = DEFAULT_FAULT_TYPE)]
    fault_type: String,

    /// Comma-separated toxics: latency, timeout, rate-limit, data-limit
    #[arg(long, env = "HTTP_CHAOS_TYPE", default_value = DEFAULT_HTTP_CHAOS_TYPE)]
    http_chaos_type: String,

    /// cpu-hog, memory-hog or io-stress
    #[arg(long, env = "STRESS_CHAOS_TYPE", default_value = DEFAULT_STRESS_CHAOS_TYPE)]
    stress_chaos_type: String,

    /// Added latency in milliseconds
    #[arg(long, env = "LATENCY", default_value_t = DEFAULT_LATENCY_MS)]
    latency: u64,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    request_timeout: u64,

    /// Rate limit in KB/s
    #[arg(long, env = "RATE_LIMIT", default_value_t = DEFAULT_RATE_LIMIT)]
    rate_limit: u64,

    /// Data limit in bytes
    #[arg(long, env = "DATA_LIMIT", default_value_t = DEFAULT_DATA_LIMIT)]
    data_limit: u64,

    /// Proxy listen port on the target
    #[arg(long, env = "LISTEN_PORT", default_value_t = DEFAULT_LISTEN_PORT)]
    listen_port: u16,

    /// Proxied service port on the target
    #[arg(long, env = "STREAM_PORT", default_value_t = DEFAULT_STREAM_PORT)]
    stream_port: u16,

    /// upstream or downstream
    #[arg(long, env = "STREAM_TYPE", default_value = DEFAULT_STREAM_TYPE)]
    stream_type: String,

    /// Install fault dependencies on the target first (true/false)
    #[arg(long, env = "INSTALL_DEPENDENCY", default_value = "true")]
    install_dependency: String,

    /// CPU cores to stress
    #[arg(long, env = "CPU_CORES", default_value_t = DEFAULT_CPU_CORES)]
    cpu_cores: u32,

    /// Number of stress workers
    #[arg(long, env = "NUMBER_OF_WORKERS", default_value_t = DEFAULT_NUMBER_OF_WORKERS)]
    workers: u32,

    /// Memory per worker in MB
    #[arg(long, env = "MEMORY_CONSUMPTION", default_value_t = DEFAULT_MEMORY_CONSUMPTION_MB)]
    memory_consumption: u64,

    /// Share of the filesystem io-stress fills, in percent
    #[arg(long, env = "FILESYSTEM_UTILIZATION_PERCENTAGE", default_value_t = 0)]
    fs_utilization_percentage: u32,

    /// Amount io-stress fills, in GB
    #[arg(long, env = "FILESYSTEM_UTILIZATION_BYTES", default_value_t = 0)]
    fs_utilization_bytes: u64,

    /// Directory io-stress writes to
    #[arg(long, env = "VOLUME_MOUNT_PATH")]
    volume_mount_path: Option<String>,

    /// linux or windows
    #[arg(long, env = "OPERATING_SYSTEM", default_value = DEFAULT_OPERATING_SYSTEM)]
    operating_system: String,

    /// Path to the inject script
    #[arg(long, env = "SCRIPT_PATH", default_value = "")]
    script_path: String,

    /// Path to the revert script
    #[arg(long, env = "ABORT_SCRIPT_PATH", default_value = "")]
    abort_script_path: String,

    /// Experiment name reported in events
    #[arg(long, env = "EXPERIMENT_NAME", default_value = DEFAULT_EXPERIMENT_NAME)]
    experiment_name: String,

    /// Chaos engine to attach events to
    #[arg(long, env = "CHAOSENGINE")]
    chaos_engine: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Seconds to wait for a single remote command
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT)]
    command_timeout: u64,

    /// Output JSON file for results
    #[arg(short, long)]
    output: Option<String>,

    /// Print the plan without contacting AWS
    #[arg(long)]
    dry_run: bool,
}

fn parse_toggle(field: &'static str, value: &str) -> Result<bool, OrchestrationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "enable" | "enabled" | "true" | "yes" => Ok(true),
        "disable" | "disabled" | "false" | "no" | "" => Ok(false),
        _ => Err(OrchestrationError::Configuration {
            field,
            value: value.to_string(),
        }),
    }
}

fn parse_enum<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, OrchestrationError> {
    value.trim().parse().map_err(|_| OrchestrationError::Configuration {
        field,
        value: value.to_string(),
    })
}

impl TryFrom<RunArgs> for RunConfig {
    type Error = OrchestrationError;

    fn try_from(args: RunArgs) -> Result<Self, Self::Error> {
        if args.interval == 0 {
            return Err(OrchestrationError::Configuration {
                field: "CHAOS_INTERVAL",
                value: "0".to_string(),
            });
        }

        let scale_set = parse_toggle("SCALE_SET", &args.scale_set)?;
        let targets = parse_targets(&args.instance_names, scale_set)?;
        let fault_type: FaultType = parse_enum("FAULT_TYPE", &args.fault_type)?;
        let stressor: Stressor = parse_enum("STRESS_CHAOS_TYPE", &args.stress_chaos_type)?;
        let sequence: SequenceMode = parse_enum("SEQUENCE", &args.sequence)?;
        let os: OperatingSystem = parse_enum("OPERATING_SYSTEM", &args.operating_system)?;

        Ok(Self {
            chaos: ChaosSpec {
                timing: TimingConfig {
                    duration: Duration::from_secs(args.duration),
                    interval: Duration::from_secs(args.interval),
                    ramp_time: Duration::from_secs(args.ramp_time),
                },
                targets: TargetConfig { targets, scale_set },
                fault: FaultConfig {
                    fault_type,
                    install_dependency: parse_toggle("INSTALL_DEPENDENCY", &args.install_dependency)?,
                    chaos_duration_secs: args.duration,
                    http: HttpFaultConfig {
                        toxics: parse_toxics(&args.http_chaos_type)?,
                        listen_port: args.listen_port,
                        stream_port: args.stream_port,
                        stream_type: args.stream_type,
                        latency_ms: args.latency,
                        request_timeout_ms: args.request_timeout,
                        rate_limit: args.rate_limit,
                        data_limit: args.data_limit,
                    },
                    stress: StressFaultConfig {
                        stressor,
                        cpu_cores: args.cpu_cores,
                        workers: args.workers,
                        memory_mb: args.memory_consumption,
                        fs_utilization_percentage: args.fs_utilization_percentage,
                        fs_utilization_gb: args.fs_utilization_bytes,
                        volume_mount_path: args.volume_mount_path,
                    },
                },
                scripts: ScriptConfig {
                    os,
                    inject_path: args.script_path,
                    revert_path: args.abort_script_path,
                },
                sequence,
                experiment_name: args.experiment_name,
                engine_name: args.chaos_engine,
            },
            aws: AwsConfig {
                region: args.region,
                aws_profile: args.aws_profile,
                command_timeout: Duration::from_secs(args.command_timeout),
            },
            flags: RuntimeFlags {
                dry_run: args.dry_run,
                output: args.output,
            },
        })
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Inject faults into the target instances
    Run(Box<RunArgs>),

    /// Parse saved Run Command output and print the verdict
    Inspect {
        /// File holding the raw command output
        file: String,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

fn print_error(e: &anyhow::Error) {
    let _ = write_error(&mut std::io::stderr().lock(), e);
}

/// Render a failed run: the error, its causes, then a remediation hint for
/// configuration mistakes or classified SSM errors.
fn write_error(out: &mut impl std::io::Write, e: &anyhow::Error) -> std::io::Result<()> {
    use std::io::Write;

    writeln!(out, "\n\x1b[1;31mError:\x1b[0m {e}")?;
    for cause in e.chain().skip(1) {
        writeln!(out, "  \x1b[33mCaused by:\x1b[0m {cause}")?;
    }

    if let Some(OrchestrationError::Configuration { field, .. }) = e.downcast_ref::<OrchestrationError>() {
        writeln!(out, "\n\x1b[36mHint:\x1b[0m set {field} (or its --flag) to a supported value")?;
    } else {
        let ssm = classify_anyhow_error(e);
        if let Some(hint) = ssm.suggestion() {
            writeln!(out, "\n\x1b[36m{ssm}\x1b[0m\n  Hint: {hint}")?;
        }
    }

    let backtrace = e.backtrace();
    if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
        writeln!(out, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}")?;
    }
    Ok(())
}

/// Returns the process exit code
async fn run() -> Result<i32> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    match args.command {
        Command::Run(run_args) => {
            let config = RunConfig::try_from(*run_args)?;
            run_chaos(config).await
        }
        Command::Inspect { file } => handle_inspect(&file),
    }
}

async fn run_chaos(config: RunConfig) -> Result<i32> {
    let spec = &config.chaos;

    if config.dry_run() {
        let scripts = prepare_scripts(spec)?;
        print_plan(spec, &scripts);
        return Ok(0);
    }

    if let Some(profile) = config.aws_profile() {
        info!(profile = %profile, "Using AWS profile");
    }
    let aws = AwsContext::with_profile(config.region(), config.aws_profile()).await;
    let account = get_current_account_id(&aws).await?;

    let run_id = uuid::Uuid::now_v7().to_string();
    info!(
        run_id = %run_id,
        account_id = %account,
        region = %aws.region(),
        fault = %spec.fault.fault_type,
        sequence = %spec.sequence,
        targets = spec.targets.targets.len(),
        "Starting chaos run"
    );

    let client = Arc::new(SsmRunCommandClient::new(
        &aws,
        WaitConfig::with_timeout(config.aws.command_timeout),
        run_id.as_str(),
    ));
    client
        .ensure_managed(&spec.targets.targets)
        .await
        .context("Target preflight failed")?;

    let abort = CancellationToken::new();
    let _signals = forward_shutdown_signals(abort.clone());

    let events = LogEmitter::new(spec.engine_name.clone(), spec.experiment_name.as_str());
    if !events.is_enabled() {
        info!("CHAOSENGINE not set, chaos events are not emitted");
    }
    let orchestrator = Orchestrator::new(client, NoProbes, events);
    let outcome = orchestrator.prepare_fault_injection(spec, abort).await?;

    print_results_summary(spec, &outcome);
    if let Some(path) = config.output() {
        write_results(path, spec, &run_id, &outcome)?;
    }

    Ok(match outcome {
        ChaosOutcome::Completed(_) => 0,
        ChaosOutcome::Aborted(_) => ABORT_EXIT_CODE,
    })
}

fn handle_inspect(file: &str) -> Result<i32> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("Failed to read {file}"))?;
    let result = inspect::inspect(&raw);

    println!("stdout ({} lines):", result.stdout.len());
    for line in &result.stdout {
        println!("  {line}");
    }
    println!("stderr ({} lines):", result.stderr.len());
    for line in &result.stderr {
        println!("  {line}");
    }

    match &result.error {
        Some(fragment) => {
            println!("\nVerdict: failure\n{fragment}");
            Ok(1)
        }
        None => {
            println!("\nVerdict: success");
            Ok(0)
        }
    }
}
