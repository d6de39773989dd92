//! Live queue session: binds the ephemeral queue to a function and publishes
//! interactively composed messages to it.

use forge_core::attributes::{example_payload, parse_message_attributes, typed_attributes};
use forge_core::policy::PolicyDocument;
use forge_core::sink::{Color, PresentationSink};
use forge_core::tracking;
use tracing::{debug, info, warn};

use crate::adapters::function::FunctionService;
use crate::adapters::identity::IdentityService;
use crate::adapters::queue::QueueService;
use crate::broker::{LiveResourceBroker, QueueSettings};
use crate::error::LiveError;
use crate::grantor::PermissionGrantor;
use crate::prompt::MessagePrompt;
use crate::source::{EventSourceKind, LiveEventSource};

pub const SUBSCRIBE_LEGEND: &str = "Setting up Lambda Trigger for SQS Queue";

#[derive(Clone, Copy)]
pub struct LiveServices<'a> {
    pub queues: &'a dyn QueueService,
    pub functions: &'a dyn FunctionService,
    pub identity: &'a dyn IdentityService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeStage {
    Unbound,
    PolicyAttached,
    QueueConfigured,
    TriggerCreated,
    Subscribed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResult {
    /// `None` when the binding failed.
    pub queue_arn: Option<String>,
    /// `Subscribed` or `Failed`.
    pub stage: SubscribeStage,
    /// Furthest non-terminal stage completed before the outcome.
    pub reached: SubscribeStage,
    pub reason: String,
}

impl SubscriptionResult {
    pub fn is_subscribed(&self) -> bool {
        self.stage == SubscribeStage::Subscribed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishRejection {
    InvalidAttributes(String),
    PromptFailed(String),
    SendFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published { message_id: String },
    Rejected(PublishRejection),
}

/// One ephemeral queue per session; its URL is fixed at construction.
pub struct LiveQueueSession<'a> {
    region: String,
    queue_url: String,
    sink: &'a dyn PresentationSink,
    broker: LiveResourceBroker<'a>,
    grantor: PermissionGrantor<'a>,
    services: LiveServices<'a>,
}

impl<'a> LiveQueueSession<'a> {
    pub fn open(
        region: impl Into<String>,
        queue_name: &str,
        policy_name: impl Into<String>,
        services: LiveServices<'a>,
        sink: &'a dyn PresentationSink,
    ) -> Result<Self, LiveError> {
        let broker = LiveResourceBroker::new(services.queues);
        let queue_url = broker.ensure_queue(queue_name)?;
        tracking::track("queue", queue_url.clone());

        Ok(Self {
            region: region.into(),
            queue_url,
            sink,
            broker,
            grantor: PermissionGrantor::new(services.functions, services.identity, policy_name),
            services,
        })
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    pub fn subscribe(&self, function_arn: &str, label: &str) -> SubscriptionResult {
        self.sink.change_spinner_legend(SUBSCRIBE_LEGEND);

        let mut reached = SubscribeStage::Unbound;
        match self.bind(function_arn, &mut reached) {
            Ok(queue_arn) => {
                info!(
                    region = %self.region,
                    %function_arn,
                    label,
                    %queue_arn,
                    "live trigger subscribed"
                );
                let reason = "Successfully subscribed Lambda to SQS Queue.".to_string();
                self.sink.print(&reason, Color::Green, 0, 0);
                SubscriptionResult {
                    queue_arn: Some(queue_arn),
                    stage: SubscribeStage::Subscribed,
                    reached,
                    reason,
                }
            }
            Err(error) => {
                warn!(%function_arn, label, ?reached, %error, "live trigger subscription failed");
                let reason = format!("Error setting up Lambda trigger: {error}");
                self.sink.print(&reason, Color::Red, 0, 0);
                SubscriptionResult {
                    queue_arn: None,
                    stage: SubscribeStage::Failed,
                    reached,
                    reason,
                }
            }
        }
    }

    // The role must hold the grant when the mapping is created, and the
    // timeout must be raised before the first delivery.
    fn bind(&self, function_arn: &str, reached: &mut SubscribeStage) -> Result<String, LiveError> {
        let queue_arn = self.broker.queue_arn(&self.queue_url)?;

        let grant = self
            .grantor
            .attach_policy(&PolicyDocument::queue_full_access(), function_arn)?;
        tracking::track("policy", format!("{}/{}", grant.role_name, grant.policy_name));
        *reached = SubscribeStage::PolicyAttached;

        self.broker
            .configure(&self.queue_url, QueueSettings::default())?;
        *reached = SubscribeStage::QueueConfigured;

        let mapping_id = self
            .services
            .functions
            .create_event_source_mapping(&queue_arn, function_arn)?;
        tracking::track("event-source-mapping", mapping_id);
        *reached = SubscribeStage::TriggerCreated;

        Ok(queue_arn)
    }

    pub fn publish(
        &self,
        raw_attributes: Option<&str>,
        prompt: &dyn MessagePrompt,
    ) -> PublishOutcome {
        self.sink.show_banner("SQS");
        self.sink.print(
            &format!("Message Attributes: {}", raw_attributes.unwrap_or("{}")),
            Color::White,
            1,
            1,
        );

        let attributes = match parse_message_attributes(raw_attributes) {
            Ok(attributes) => attributes,
            Err(error) => {
                return self.reject(PublishRejection::InvalidAttributes(error.to_string()));
            }
        };

        let typed = match typed_attributes(&attributes) {
            Ok(typed) => typed,
            Err(error) => {
                return self.reject(PublishRejection::InvalidAttributes(error.to_string()));
            }
        };

        let body = match prompt.message_body() {
            Ok(body) => body,
            Err(error) => return self.reject(PublishRejection::PromptFailed(error.to_string())),
        };

        debug!(queue_url = %self.queue_url, %body, "sending live message");
        match self
            .services
            .queues
            .send_message(&self.queue_url, &body, &typed)
        {
            Ok(message_id) => {
                info!(%message_id, "live message published");
                self.sink
                    .print("Message Published Successfully!", Color::Green, 0, 0);
                PublishOutcome::Published { message_id }
            }
            Err(error) => self.reject(PublishRejection::SendFailed(error.to_string())),
        }
    }

    fn reject(&self, rejection: PublishRejection) -> PublishOutcome {
        warn!(?rejection, "live message rejected");
        print_failure(self.sink);
        PublishOutcome::Rejected(rejection)
    }
}

impl LiveEventSource for LiveQueueSession<'_> {
    fn kind(&self) -> EventSourceKind {
        EventSourceKind::Sqs
    }

    fn subscribe(&self, function_arn: &str, label: &str) -> SubscriptionResult {
        LiveQueueSession::subscribe(self, function_arn, label)
    }

    fn publish(&self, raw_attributes: Option<&str>, prompt: &dyn MessagePrompt) -> PublishOutcome {
        LiveQueueSession::publish(self, raw_attributes, prompt)
    }
}

pub fn print_failure(sink: &dyn PresentationSink) {
    sink.print("Failed to Publish Message!", Color::Red, 0, 0);
    sink.print("Example of a Valid Payload: ", Color::Gray, 1, 0);
    let example = serde_json::to_string_pretty(&example_payload())
        .unwrap_or_else(|_| example_payload().to_string());
    sink.print(&example, Color::Gray, 1, 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        FakeFunctions, FakeIdentity, FakeQueues, RecordingSink, ScriptedPrompt, SinkEvent,
    };

    const FUNCTION: &str = "arn:aws:lambda:us-east-2:123456789012:function:orders";
    const ROLE: &str = "arn:aws:iam::123456789012:role/orders-role";

    struct Fixture {
        queues: FakeQueues,
        functions: FakeFunctions,
        identity: FakeIdentity,
        sink: RecordingSink,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                queues: FakeQueues::default(),
                functions: FakeFunctions::with_role(FUNCTION, ROLE),
                identity: FakeIdentity::default(),
                sink: RecordingSink::default(),
            }
        }

        fn session(&self) -> LiveQueueSession<'_> {
            LiveQueueSession::open(
                "us-east-2",
                "Live-Queue",
                "dev-myproj-live-queue-access",
                LiveServices {
                    queues: &self.queues,
                    functions: &self.functions,
                    identity: &self.identity,
                },
                &self.sink,
            )
            .expect("session should open")
        }
    }

    #[test]
    fn reopening_session_reuses_queue_url() {
        let fixture = Fixture::new();
        let first = fixture.session().queue_url().to_string();
        let second = fixture.session().queue_url().to_string();
        assert_eq!(first, second);
        assert_eq!(fixture.queues.queue_count(), 1);
    }

    #[test]
    fn subscribe_walks_every_stage_in_order() {
        let fixture = Fixture::new();
        let session = fixture.session();

        let result = session.subscribe(FUNCTION, "orders");

        assert!(result.is_subscribed());
        assert_eq!(result.reached, SubscribeStage::TriggerCreated);
        let queue_arn = result.queue_arn.expect("queue arn");
        assert_eq!(fixture.functions.mappings(), vec![(queue_arn, FUNCTION.to_string())]);
        assert_eq!(fixture.queues.visibility_timeout(session.queue_url()), Some(900));
        assert_eq!(fixture.identity.attached().len(), 1);
        assert_eq!(
            fixture.sink.events()[0],
            SinkEvent::Legend(SUBSCRIBE_LEGEND.to_string())
        );
        assert!(fixture
            .sink
            .printed(Color::Green)
            .contains(&"Successfully subscribed Lambda to SQS Queue.".to_string()));
    }

    #[test]
    fn subscribe_without_role_fails_before_configuring_queue() {
        let mut fixture = Fixture::new();
        fixture.functions = FakeFunctions::default();
        let session = fixture.session();

        let result = session.subscribe(FUNCTION, "orders");

        assert_eq!(result.stage, SubscribeStage::Failed);
        assert_eq!(result.reached, SubscribeStage::Unbound);
        assert!(result.queue_arn.is_none());
        assert!(fixture.functions.mappings().is_empty());
        assert_eq!(fixture.queues.visibility_timeout(session.queue_url()), None);
        assert_eq!(fixture.sink.printed(Color::Red).len(), 1);
    }

    #[test]
    fn subscribe_reports_mapping_failure_after_configuring_queue() {
        let mut fixture = Fixture::new();
        fixture.functions = FakeFunctions::with_role(FUNCTION, ROLE).failing_mappings();
        let session = fixture.session();

        let result = session.subscribe(FUNCTION, "orders");

        assert_eq!(result.stage, SubscribeStage::Failed);
        assert_eq!(result.reached, SubscribeStage::QueueConfigured);
        assert!(result.reason.starts_with("Error setting up Lambda trigger:"));
    }

    #[test]
    fn resubscribing_creates_a_second_mapping() {
        let fixture = Fixture::new();
        let session = fixture.session();

        assert!(session.subscribe(FUNCTION, "orders").is_subscribed());
        assert!(session.subscribe(FUNCTION, "orders").is_subscribed());
        assert_eq!(fixture.functions.mappings().len(), 2);
    }

    #[test]
    fn publish_rejects_non_object_attributes_before_prompting() {
        for raw in ["5", "[1,2]", "not a json object"] {
            let fixture = Fixture::new();
            let session = fixture.session();
            let prompt = ScriptedPrompt::new(["hello"]);

            let outcome = session.publish(Some(raw), &prompt);

            assert!(matches!(
                outcome,
                PublishOutcome::Rejected(PublishRejection::InvalidAttributes(_))
            ));
            assert_eq!(prompt.calls(), 0);
            assert!(fixture.queues.sent().is_empty());
            assert!(fixture
                .sink
                .printed(Color::Red)
                .contains(&"Failed to Publish Message!".to_string()));
            assert!(fixture
                .sink
                .printed(Color::Gray)
                .iter()
                .any(|text| text.contains("\"Author\"")));
        }
    }

    #[test]
    fn publish_sends_body_with_typed_attributes() {
        let fixture = Fixture::new();
        let session = fixture.session();
        let prompt = ScriptedPrompt::new(["hello"]);

        let outcome = session.publish(
            Some(r#"{"Author":{"StringValue":"Daniel","DataType":"String"}}"#),
            &prompt,
        );

        assert!(matches!(outcome, PublishOutcome::Published { .. }));
        let sent = fixture.queues.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "hello");
        assert_eq!(sent[0].attributes["Author"].string_value.as_deref(), Some("Daniel"));
        assert_eq!(fixture.sink.events()[0], SinkEvent::Banner("SQS".to_string()));
    }

    #[test]
    fn publish_reports_send_failure() {
        let mut fixture = Fixture::new();
        fixture.queues = FakeQueues::default().failing_sends();
        let session = fixture.session();

        let outcome = session.publish(None, &ScriptedPrompt::new(["hello"]));

        assert!(matches!(
            outcome,
            PublishOutcome::Rejected(PublishRejection::SendFailed(_))
        ));
        assert!(fixture
            .sink
            .printed(Color::Red)
            .contains(&"Failed to Publish Message!".to_string()));
    }

    #[test]
    fn publish_rejects_untyped_attribute_values_without_sending() {
        let fixture = Fixture::new();
        let session = fixture.session();

        let prompt = ScriptedPrompt::new(["hello"]);

        let outcome = session.publish(Some(r#"{"k":"v"}"#), &prompt);

        assert!(matches!(
            outcome,
            PublishOutcome::Rejected(PublishRejection::InvalidAttributes(_))
        ));
        assert_eq!(prompt.calls(), 0);
        assert!(fixture.queues.sent().is_empty());
    }

    #[test]
    fn publish_reports_aborted_prompt() {
        let fixture = Fixture::new();
        let session = fixture.session();
        let prompt = ScriptedPrompt::new(Vec::<&str>::new());

        let outcome = session.publish(None, &prompt);

        assert!(matches!(
            outcome,
            PublishOutcome::Rejected(PublishRejection::PromptFailed(_))
        ));
        assert_eq!(prompt.calls(), 1);
    }
}
