//! Shared live-trigger domain primitives.
//!
//! This crate owns context resolution, message attribute validation, trigger
//! payload reshaping and the presentation sink interface. It intentionally
//! excludes AWS SDK and console rendering concerns, which live in `forge_live`.

pub mod attributes;
pub mod context;
pub mod policy;
pub mod reshape;
pub mod sink;
pub mod tracking;
