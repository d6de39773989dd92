use tracing::info;

use crate::adapters::queue::QueueService;
use crate::error::PlatformError;

pub const LIVE_QUEUE_NAME: &str = "Live-Queue";

/// Matches the maximum function run time (15 minutes).
pub const LIVE_VISIBILITY_TIMEOUT_SECS: u32 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueSettings {
    pub visibility_timeout_secs: u32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            visibility_timeout_secs: LIVE_VISIBILITY_TIMEOUT_SECS,
        }
    }
}

/// Owns the lifecycle calls for the session's ephemeral queue. No retries.
pub struct LiveResourceBroker<'a> {
    queues: &'a dyn QueueService,
}

impl<'a> LiveResourceBroker<'a> {
    pub fn new(queues: &'a dyn QueueService) -> Self {
        Self { queues }
    }

    pub fn ensure_queue(&self, name: &str) -> Result<String, PlatformError> {
        let queue_url = self.queues.create_queue(name)?;
        info!(queue = name, %queue_url, "live queue ready");
        Ok(queue_url)
    }

    pub fn queue_arn(&self, queue_url: &str) -> Result<String, PlatformError> {
        self.queues.queue_arn(queue_url)
    }

    pub fn configure(&self, queue_url: &str, settings: QueueSettings) -> Result<(), PlatformError> {
        self.queues
            .set_visibility_timeout(queue_url, settings.visibility_timeout_secs)?;
        info!(
            %queue_url,
            visibility_timeout_secs = settings.visibility_timeout_secs,
            "live queue configured"
        );
        Ok(())
    }
}
