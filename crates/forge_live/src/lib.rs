//! AWS-backed live trigger orchestration.
//!
//! This crate owns the cloud service adapters, the permission grant, the
//! ephemeral queue lifecycle and the interactive publish flow. Pure domain
//! rules (context resolution, attribute validation, payload reshaping) live
//! in `forge_core`.

pub mod adapters;
pub mod broker;
pub mod error;
pub mod grantor;
pub mod logging;
pub mod printer;
pub mod prompt;
pub mod session;
pub mod source;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
