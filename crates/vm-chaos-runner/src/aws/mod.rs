//! AWS client modules for the runner
//!
//! - SSM: Run Command submission and invocation polling
//! - STS: Account ID lookup

pub mod account;
pub mod context;
pub mod error;
pub mod ssm;

pub use account::{AccountId, get_current_account_id};
pub use context::AwsContext;
pub use error::{SsmError, classify_anyhow_error, classify_ssm_error};
pub use ssm::SsmRunCommandClient;
