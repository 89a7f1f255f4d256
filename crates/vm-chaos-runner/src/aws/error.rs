//! SSM error classification
//!
//! Classifies AWS SDK errors by their `.code()` so the polling loop can tell
//! "not visible yet" and throttling apart from real failures.

use aws_sdk_ssm::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_ssm::operation::describe_instance_information::DescribeInstanceInformationError;
use aws_sdk_ssm::operation::get_command_invocation::GetCommandInvocationError;
use aws_sdk_ssm::operation::send_command::SendCommandError;
use thiserror::Error;

/// SSM error categories
#[derive(Debug, Error)]
pub enum SsmError {
    /// The invocation is not registered yet (eventual consistency, retryable)
    #[error("Command invocation not yet visible")]
    InvocationNotReady,

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Target is not a managed instance or is not running the agent
    #[error("Instance is not a managed SSM instance: {message}")]
    InvalidInstance { message: String },

    /// Credentials lack the required permission
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl SsmError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SsmError::InvocationNotReady | SsmError::Throttled)
    }

    /// A user-facing hint for resolving this error, if one is known.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            SsmError::InvalidInstance { .. } => Some(
                "Check that the instance is running, has the SSM agent installed, \
                 and has an instance profile allowing AmazonSSMManagedInstanceCore.",
            ),
            SsmError::AccessDenied { .. } => Some(
                "The credentials need ssm:SendCommand and ssm:GetCommandInvocation on the targets.",
            ),
            SsmError::Sdk { code: Some(c), .. } => suggestion_for_code(c),
            _ => None,
        }
    }
}

const NOT_READY_CODES: &[&str] = &["InvocationDoesNotExist"];

const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "TooManyUpdates"];

const INVALID_INSTANCE_CODES: &[&str] = &["InvalidInstanceId", "InvalidInstanceInformationFilterValue"];

const ACCESS_DENIED_CODES: &[&str] = &["AccessDeniedException", "UnauthorizedOperation"];

/// Classify an SSM error from its code and message.
pub fn classify_ssm_error(code: Option<&str>, message: Option<&str>) -> SsmError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_READY_CODES.contains(&c) => SsmError::InvocationNotReady,
        Some(c) if THROTTLING_CODES.contains(&c) => SsmError::Throttled,
        Some(c) if INVALID_INSTANCE_CODES.contains(&c) => SsmError::InvalidInstance { message },
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => SsmError::AccessDenied { message },
        _ => SsmError::Sdk {
            code: code.map(str::to_string),
            message,
        },
    }
}

/// Classify an error chain by finding the SSM SDK error inside it.
pub fn classify_anyhow_error(error: &anyhow::Error) -> SsmError {
    for cause in error.chain() {
        if let Some(e) = cause.downcast_ref::<SdkError<SendCommandError>>() {
            return classify_ssm_error(e.code(), e.message());
        }
        if let Some(e) = cause.downcast_ref::<SdkError<GetCommandInvocationError>>() {
            return classify_ssm_error(e.code(), e.message());
        }
        if let Some(e) = cause.downcast_ref::<SdkError<DescribeInstanceInformationError>>() {
            return classify_ssm_error(e.code(), e.message());
        }
    }

    SsmError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "InvalidDocument",
        "The Run Command document does not exist in this region.",
    ),
    (
        "UnsupportedPlatformType",
        "The target OS does not match the script type; check OPERATING_SYSTEM.",
    ),
    (
        "InvalidParameters",
        "The script parameters were rejected; check the script and fault settings.",
    ),
];

fn suggestion_for_code(code: &str) -> Option<&'static str> {
    SUGGESTIONS.iter().find(|(c, _)| *c == code).map(|(_, s)| *s)
}
