//! Ports onto the three cloud services the orchestrator drives, plus their
//! AWS SDK implementations.
//!
//! The SDK is async while the orchestrator is a blocking, single-threaded
//! flow, so every AWS call is bridged with `block_in_place` on the current
//! multi-threaded runtime.

use std::future::Future;

use aws_sdk_sqs::error::ProvideErrorMetadata;

use crate::error::PlatformError;

pub mod function;
pub mod identity;
pub mod queue;

/// Loads the default credential chain with the region pinned to `region`.
pub fn load_sdk_config(region: &str) -> aws_config::SdkConfig {
    let region = aws_config::Region::new(region.to_string());
    block_on(
        aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(region)
            .load(),
    )
}

pub(crate) fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

pub(crate) fn platform_error<E>(operation: &'static str, error: &E) -> PlatformError
where
    E: ProvideErrorMetadata + std::fmt::Display,
{
    let message = error
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    PlatformError::from_code(operation, error.code(), message)
}
