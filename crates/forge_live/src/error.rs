use forge_core::attributes::AttributeError;
use forge_core::context::ContextError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    AlreadyExists,
    NotFound,
    AccessDenied,
    Other,
}

/// Failure reported by one of the cloud services, with the service's own
/// message preserved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct PlatformError {
    pub operation: &'static str,
    pub kind: PlatformErrorKind,
    pub message: String,
}

impl PlatformError {
    pub fn new(
        operation: &'static str,
        kind: PlatformErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
        }
    }

    pub fn other(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(operation, PlatformErrorKind::Other, message)
    }

    /// Maps an AWS error code onto a coarse kind.
    pub fn from_code(
        operation: &'static str,
        code: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        let kind = match code {
            Some("EntityAlreadyExists" | "ResourceConflictException") => {
                PlatformErrorKind::AlreadyExists
            }
            Some(
                "NoSuchEntity"
                | "ResourceNotFoundException"
                | "AWS.SimpleQueueService.NonExistentQueue"
                | "QueueDoesNotExist",
            ) => PlatformErrorKind::NotFound,
            Some("AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation") => {
                PlatformErrorKind::AccessDenied
            }
            _ => PlatformErrorKind::Other,
        };
        Self::new(operation, kind, message)
    }
}

#[derive(Debug, Error)]
pub enum LiveError {
    #[error(transparent)]
    Configuration(#[from] ContextError),
    #[error(transparent)]
    Validation(#[from] AttributeError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("cannot resolve execution role for {function}: {message}")]
    Permission { function: String, message: String },
    #[error("failed to read input: {0}")]
    Prompt(String),
}
