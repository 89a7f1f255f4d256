//! Default configuration values
//!
//! These constants are the fallbacks used when neither a CLI flag nor the
//! corresponding environment variable is set.

/// Default total chaos duration in seconds
pub const DEFAULT_CHAOS_DURATION: u64 = 30;

/// Default interval between injection and completion check, in seconds
pub const DEFAULT_CHAOS_INTERVAL: u64 = 30;

/// Default ramp time in seconds (no ramp)
pub const DEFAULT_RAMP_TIME: u64 = 0;

/// Default experiment name reported in events and logs
pub const DEFAULT_EXPERIMENT_NAME: &str = "vm-http-chaos";

/// Default sequence mode
pub const DEFAULT_SEQUENCE: &str = "serial";

/// Default fault type
pub const DEFAULT_FAULT_TYPE: &str = "http-chaos";

/// Default HTTP toxic list
pub const DEFAULT_HTTP_CHAOS_TYPE: &str = "latency";

/// Default stressor
pub const DEFAULT_STRESS_CHAOS_TYPE: &str = "cpu-hog";

/// Default proxy listen port on the target
pub const DEFAULT_LISTEN_PORT: u16 = 20000;

/// Default proxied service port on the target
pub const DEFAULT_STREAM_PORT: u16 = 6379;

/// Default stream direction
pub const DEFAULT_STREAM_TYPE: &str = "upstream";

/// Default added latency in milliseconds
pub const DEFAULT_LATENCY_MS: u64 = 2000;

/// Default request timeout in milliseconds
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;

/// Default rate limit (KB/s)
pub const DEFAULT_RATE_LIMIT: u64 = 100;

/// Default data limit in bytes
pub const DEFAULT_DATA_LIMIT: u64 = 10000;

/// Default number of CPU cores to stress
pub const DEFAULT_CPU_CORES: u32 = 1;

/// Default number of stress workers
pub const DEFAULT_NUMBER_OF_WORKERS: u32 = 1;

/// Default memory consumption per worker in MB
pub const DEFAULT_MEMORY_CONSUMPTION_MB: u64 = 500;

/// Filesystem utilisation used by io-stress when neither percentage nor bytes is set
pub const DEFAULT_FILESYSTEM_UTILIZATION: &str = "10%";

/// Default target operating system
pub const DEFAULT_OPERATING_SYSTEM: &str = "linux";

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-2";

/// Default upper bound on a single remote command, in seconds
pub const DEFAULT_COMMAND_TIMEOUT: u64 = 600;
