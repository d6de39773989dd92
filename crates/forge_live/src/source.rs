//! Event-source capability interface, one implementation per source kind.

use clap::ValueEnum;
use forge_core::context::Context;
use forge_core::reshape::{reshape, ReshapeError, TriggerEnvelope};
use forge_core::sink::PresentationSink;
use serde_json::Value;

use crate::error::LiveError;
use crate::prompt::MessagePrompt;
use crate::session::{LiveQueueSession, LiveServices, PublishOutcome, SubscriptionResult};

/// Suffix passed to [`Context::gen_id`] to name the session's access policy.
pub const LIVE_POLICY_RESOURCE: &str = "live-queue-access";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum EventSourceKind {
    #[default]
    Sqs,
}

impl EventSourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqs => "sqs",
        }
    }

    /// Reduces a captured trigger event to the fields worth inspecting.
    pub fn reshape(self, event: &Value) -> Result<TriggerEnvelope, ReshapeError> {
        match self {
            Self::Sqs => reshape(event),
        }
    }
}

pub trait LiveEventSource {
    fn kind(&self) -> EventSourceKind;

    /// Provisions access and binds the source to `function_arn`. Never
    /// fails outright; failures come back as an unsubscribed result.
    fn subscribe(&self, function_arn: &str, label: &str) -> SubscriptionResult;

    fn publish(&self, raw_attributes: Option<&str>, prompt: &dyn MessagePrompt) -> PublishOutcome;
}

pub fn open_source<'a>(
    kind: EventSourceKind,
    context: &Context,
    queue_name: &str,
    services: LiveServices<'a>,
    sink: &'a dyn PresentationSink,
) -> Result<Box<dyn LiveEventSource + 'a>, LiveError> {
    match kind {
        EventSourceKind::Sqs => {
            let session = LiveQueueSession::open(
                context.region(),
                queue_name,
                context.gen_id(LIVE_POLICY_RESOURCE),
                services,
                sink,
            )?;
            Ok(Box::new(session))
        }
    }
}
