//! Process-wide tracking of resources touched by the current command.
//!
//! Entries are scoped to a single command invocation: [`crate::context::with_context`]
//! calls [`reset`] before the command body runs, so nothing recorded by one
//! invocation is visible to the next one made in the same process.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    pub kind: String,
    pub id: String,
}

static TRACKED: Mutex<Vec<TrackedEntry>> = Mutex::new(Vec::new());

fn registry() -> MutexGuard<'static, Vec<TrackedEntry>> {
    TRACKED.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn track(kind: impl Into<String>, id: impl Into<String>) {
    let entry = TrackedEntry {
        kind: kind.into(),
        id: id.into(),
    };
    tracing::debug!(kind = %entry.kind, id = %entry.id, "tracking resource");
    registry().push(entry);
}

pub fn tracked() -> Vec<TrackedEntry> {
    registry().clone()
}

pub fn reset() {
    registry().clear();
}

/// Serializes tests that touch the process-wide registry.
#[cfg(test)]
pub(crate) static TEST_LOCK: Mutex<()> = Mutex::new(());
