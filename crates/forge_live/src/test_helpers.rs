//! In-memory stand-ins for the cloud services, the presentation sink and the
//! message prompt.
//!
//! Shared by the unit tests in this crate and by the integration tests under
//! `tests/`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use forge_core::attributes::TypedAttribute;
use forge_core::sink::{Color, PresentationSink};

use crate::adapters::function::FunctionService;
use crate::adapters::identity::IdentityService;
use crate::adapters::queue::QueueService;
use crate::error::{LiveError, PlatformError, PlatformErrorKind};
use crate::prompt::MessagePrompt;

pub const TEST_ACCOUNT: &str = "123456789012";
pub const TEST_REGION: &str = "us-east-2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub queue_url: String,
    pub body: String,
    pub attributes: BTreeMap<String, TypedAttribute>,
}

#[derive(Default)]
struct QueueState {
    urls_by_name: BTreeMap<String, String>,
    visibility_timeouts: BTreeMap<String, u32>,
    sent: Vec<SentMessage>,
}

#[derive(Default)]
pub struct FakeQueues {
    state: Mutex<QueueState>,
    fail_sends: bool,
}

impl FakeQueues {
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn queue_count(&self) -> usize {
        self.state.lock().expect("poisoned mutex").urls_by_name.len()
    }

    pub fn visibility_timeout(&self, queue_url: &str) -> Option<u32> {
        self.state
            .lock()
            .expect("poisoned mutex")
            .visibility_timeouts
            .get(queue_url)
            .copied()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.lock().expect("poisoned mutex").sent.clone()
    }

    fn queue_name(state: &QueueState, queue_url: &str) -> Option<String> {
        state
            .urls_by_name
            .iter()
            .find(|(_, url)| url.as_str() == queue_url)
            .map(|(name, _)| name.clone())
    }
}

impl QueueService for FakeQueues {
    fn create_queue(&self, name: &str) -> Result<String, PlatformError> {
        let mut state = self.state.lock().expect("poisoned mutex");
        let url = state
            .urls_by_name
            .entry(name.to_string())
            .or_insert_with(|| {
                format!("https://sqs.{TEST_REGION}.amazonaws.com/{TEST_ACCOUNT}/{name}")
            })
            .clone();
        Ok(url)
    }

    fn queue_arn(&self, queue_url: &str) -> Result<String, PlatformError> {
        let state = self.state.lock().expect("poisoned mutex");
        Self::queue_name(&state, queue_url)
            .map(|name| format!("arn:aws:sqs:{TEST_REGION}:{TEST_ACCOUNT}:{name}"))
            .ok_or_else(|| {
                PlatformError::new(
                    "get_queue_attributes",
                    PlatformErrorKind::NotFound,
                    "The specified queue does not exist.",
                )
            })
    }

    fn set_visibility_timeout(&self, queue_url: &str, seconds: u32) -> Result<(), PlatformError> {
        let mut state = self.state.lock().expect("poisoned mutex");
        state
            .visibility_timeouts
            .insert(queue_url.to_string(), seconds);
        Ok(())
    }

    fn send_message(
        &self,
        queue_url: &str,
        body: &str,
        attributes: &BTreeMap<String, TypedAttribute>,
    ) -> Result<String, PlatformError> {
        if self.fail_sends {
            return Err(PlatformError::other("send_message", "throttled"));
        }
        let mut state = self.state.lock().expect("poisoned mutex");
        state.sent.push(SentMessage {
            queue_url: queue_url.to_string(),
            body: body.to_string(),
            attributes: attributes.clone(),
        });
        Ok(format!("message-{}", state.sent.len()))
    }
}

#[derive(Default)]
pub struct FakeFunctions {
    roles: BTreeMap<String, String>,
    mappings: Mutex<Vec<(String, String)>>,
    fail_mappings: bool,
}

impl FakeFunctions {
    pub fn with_role(function: &str, role_arn: &str) -> Self {
        Self {
            roles: BTreeMap::from([(function.to_string(), role_arn.to_string())]),
            ..Self::default()
        }
    }

    pub fn failing_mappings(mut self) -> Self {
        self.fail_mappings = true;
        self
    }

    /// `(event_source_arn, function)` pairs in creation order.
    pub fn mappings(&self) -> Vec<(String, String)> {
        self.mappings.lock().expect("poisoned mutex").clone()
    }
}

impl FunctionService for FakeFunctions {
    fn function_role_arn(&self, function: &str) -> Result<String, PlatformError> {
        self.roles.get(function).cloned().ok_or_else(|| {
            PlatformError::new(
                "get_function_configuration",
                PlatformErrorKind::NotFound,
                format!("Function not found: {function}"),
            )
        })
    }

    fn create_event_source_mapping(
        &self,
        event_source_arn: &str,
        function: &str,
    ) -> Result<String, PlatformError> {
        if self.fail_mappings {
            return Err(PlatformError::new(
                "create_event_source_mapping",
                PlatformErrorKind::AccessDenied,
                "The provided execution role does not have permissions to call ReceiveMessage on SQS",
            ));
        }
        let mut mappings = self.mappings.lock().expect("poisoned mutex");
        mappings.push((event_source_arn.to_string(), function.to_string()));
        Ok(format!("mapping-{}", mappings.len()))
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    attached: Mutex<Vec<(String, String, String)>>,
}

impl FakeIdentity {
    /// `(role_name, policy_name, policy_document)` triples.
    pub fn attached(&self) -> Vec<(String, String, String)> {
        self.attached.lock().expect("poisoned mutex").clone()
    }
}

impl IdentityService for FakeIdentity {
    fn role_policy_exists(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<bool, PlatformError> {
        let attached = self.attached.lock().expect("poisoned mutex");
        Ok(attached
            .iter()
            .any(|(role, policy, _)| role == role_name && policy == policy_name))
    }

    /// Overwrites a same-named policy on the role without complaint.
    fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), PlatformError> {
        let mut attached = self.attached.lock().expect("poisoned mutex");
        let existing = attached
            .iter_mut()
            .find(|(role, policy, _)| role == role_name && policy == policy_name);
        match existing {
            Some(entry) => entry.2 = policy_document.to_string(),
            None => attached.push((
                role_name.to_string(),
                policy_name.to_string(),
                policy_document.to_string(),
            )),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Print {
        text: String,
        color: Color,
        blank_before: usize,
        blank_after: usize,
    },
    Banner(String),
    Legend(String),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().expect("poisoned mutex").clone()
    }

    pub fn printed(&self, color: Color) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Print {
                    text, color: c, ..
                } if c == color => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl PresentationSink for RecordingSink {
    fn print(&self, text: &str, color: Color, blank_before: usize, blank_after: usize) {
        self.events.lock().expect("poisoned mutex").push(SinkEvent::Print {
            text: text.to_string(),
            color,
            blank_before,
            blank_after,
        });
    }

    fn show_banner(&self, title: &str) {
        self.events
            .lock()
            .expect("poisoned mutex")
            .push(SinkEvent::Banner(title.to_string()));
    }

    fn change_spinner_legend(&self, text: &str) {
        self.events
            .lock()
            .expect("poisoned mutex")
            .push(SinkEvent::Legend(text.to_string()));
    }
}

/// Replays canned message bodies; fails once they run out.
pub struct ScriptedPrompt {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().expect("poisoned mutex")
    }
}

impl MessagePrompt for ScriptedPrompt {
    fn message_body(&self) -> Result<String, LiveError> {
        *self.calls.lock().expect("poisoned mutex") += 1;
        self.responses
            .lock()
            .expect("poisoned mutex")
            .pop_front()
            .ok_or_else(|| LiveError::Prompt("no scripted input left".to_string()))
    }
}
