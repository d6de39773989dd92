use std::fs;
use std::sync::{Mutex, PoisonError};

use forge_core::context::with_context;
use forge_core::sink::Color;
use forge_core::tracking;
use forge_live::session::{LiveServices, PublishOutcome, SubscribeStage};
use forge_live::source::{open_source, EventSourceKind, LiveEventSource};
use forge_live::test_helpers::{
    FakeFunctions, FakeIdentity, FakeQueues, RecordingSink, ScriptedPrompt,
};
use serde_json::json;

const FUNCTION: &str = "arn:aws:lambda:us-east-2:123456789012:function:dev-myproj-orders";
const ROLE: &str = "arn:aws:iam::123456789012:role/service-role/dev-myproj-orders-role";

static TRACKING_LOCK: Mutex<()> = Mutex::new(());

fn config_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let document = json!({
        "context": {
            "name": "myproj",
            "repo": "acme/myproj",
            "region": "us-east-2",
            "account": "123456789012",
            "bucket": "myproj-artifacts",
            "dev": {"arns": {}}
        }
    });
    fs::write(dir.path().join("cdk.json"), document.to_string()).expect("write config");
    dir
}

#[test]
fn subscribe_then_publish_through_resolved_context() {
    let _guard = TRACKING_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let dir = config_dir();
    let queues = FakeQueues::default();
    let functions = FakeFunctions::with_role(FUNCTION, ROLE);
    let identity = FakeIdentity::default();
    let sink = RecordingSink::default();

    let (subscription, outcome, tracked) =
        with_context(dir.path().join("cdk.json"), "dev", "dev", |context| {
            let services = LiveServices {
                queues: &queues,
                functions: &functions,
                identity: &identity,
            };
            let source = open_source(EventSourceKind::Sqs, &context, "Live-Queue", services, &sink)
                .expect("session");
            let subscription = source.subscribe(FUNCTION, "orders");
            let outcome = source.publish(
                Some(r#"{"Author":{"StringValue":"Daniel","DataType":"String"}}"#),
                &ScriptedPrompt::new(["{\"order_id\": 42}"]),
            );
            (subscription, outcome, tracking::tracked())
        })
        .expect("context should resolve");

    assert_eq!(subscription.stage, SubscribeStage::Subscribed);
    assert_eq!(
        subscription.queue_arn.as_deref(),
        Some("arn:aws:sqs:us-east-2:123456789012:Live-Queue")
    );
    assert!(matches!(outcome, PublishOutcome::Published { .. }));

    let attached = identity.attached();
    assert_eq!(attached[0].0, "dev-myproj-orders-role");
    assert_eq!(attached[0].1, "dev-myproj-live-queue-access");
    assert_eq!(queues.sent()[0].body, "{\"order_id\": 42}");

    let kinds: Vec<_> = tracked.iter().map(|entry| entry.kind.as_str()).collect();
    assert_eq!(kinds, vec!["queue", "policy", "event-source-mapping"]);
}

#[test]
fn unknown_function_leaves_no_mapping_and_later_publish_still_works() {
    let _guard = TRACKING_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let dir = config_dir();
    let queues = FakeQueues::default();
    let functions = FakeFunctions::default();
    let identity = FakeIdentity::default();
    let sink = RecordingSink::default();

    with_context(dir.path().join("cdk.json"), "dev", "dev", |context| {
        let services = LiveServices {
            queues: &queues,
            functions: &functions,
            identity: &identity,
        };
        let source = open_source(EventSourceKind::Sqs, &context, "Live-Queue", services, &sink)
            .expect("session");

        let subscription = source.subscribe(FUNCTION, "orders");
        assert_eq!(subscription.stage, SubscribeStage::Failed);
        assert_eq!(subscription.reached, SubscribeStage::Unbound);
        assert!(subscription.queue_arn.is_none());

        let outcome = source.publish(None, &ScriptedPrompt::new(["ping"]));
        assert!(matches!(outcome, PublishOutcome::Published { .. }));
    })
    .expect("context should resolve");

    assert!(functions.mappings().is_empty());
    assert!(identity.attached().is_empty());
    assert!(sink.printed(Color::Red)[0].starts_with("Error setting up Lambda trigger:"));
}

#[test]
fn reshapes_captured_queue_event() {
    let event = json!({
        "Records": [{
            "messageId": "19dd0b57-b21e-4ac1-bd88-01bbb068cb78",
            "body": "hello",
            "messageAttributes": {"k": "v"},
            "eventSourceARN": "arn:aws:sqs:us-east-2:123456789012:Live-Queue"
        }]
    });

    let envelope = EventSourceKind::Sqs.reshape(&event).expect("reshape");

    assert_eq!(
        serde_json::to_value(envelope).expect("serialize"),
        json!({"Records": [{"body": "hello", "messageAttributes": {"k": "v"}}]})
    );
}
