use std::collections::{BTreeMap, HashMap};

use aws_sdk_sqs::primitives::Blob;
use aws_sdk_sqs::types::{MessageAttributeValue, QueueAttributeName};
use forge_core::attributes::TypedAttribute;

use super::{block_on, platform_error};
use crate::error::PlatformError;

pub trait QueueService {
    /// Returns the URL of the queue named `name`, creating it when absent.
    fn create_queue(&self, name: &str) -> Result<String, PlatformError>;

    fn queue_arn(&self, queue_url: &str) -> Result<String, PlatformError>;

    fn set_visibility_timeout(&self, queue_url: &str, seconds: u32) -> Result<(), PlatformError>;

    /// Returns the message id assigned by the queue.
    fn send_message(
        &self,
        queue_url: &str,
        body: &str,
        attributes: &BTreeMap<String, TypedAttribute>,
    ) -> Result<String, PlatformError>;
}

pub struct AwsQueueService {
    sqs_client: aws_sdk_sqs::Client,
}

impl AwsQueueService {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            sqs_client: aws_sdk_sqs::Client::new(config),
        }
    }
}

impl QueueService for AwsQueueService {
    fn create_queue(&self, name: &str) -> Result<String, PlatformError> {
        let client = self.sqs_client.clone();
        let output = block_on(async move { client.create_queue().queue_name(name).send().await })
            .map_err(|error| platform_error("create_queue", &error))?;
        output
            .queue_url()
            .map(str::to_string)
            .ok_or_else(|| PlatformError::other("create_queue", "response carried no queue URL"))
    }

    fn queue_arn(&self, queue_url: &str) -> Result<String, PlatformError> {
        let client = self.sqs_client.clone();
        let output = block_on(async move {
            client
                .get_queue_attributes()
                .queue_url(queue_url)
                .attribute_names(QueueAttributeName::QueueArn)
                .send()
                .await
        })
        .map_err(|error| platform_error("get_queue_attributes", &error))?;
        output
            .attributes()
            .and_then(|attributes| attributes.get(&QueueAttributeName::QueueArn))
            .cloned()
            .ok_or_else(|| {
                PlatformError::other("get_queue_attributes", "response carried no QueueArn")
            })
    }

    fn set_visibility_timeout(&self, queue_url: &str, seconds: u32) -> Result<(), PlatformError> {
        let client = self.sqs_client.clone();
        block_on(async move {
            client
                .set_queue_attributes()
                .queue_url(queue_url)
                .attributes(QueueAttributeName::VisibilityTimeout, seconds.to_string())
                .send()
                .await
        })
        .map(|_| ())
        .map_err(|error| platform_error("set_queue_attributes", &error))
    }

    fn send_message(
        &self,
        queue_url: &str,
        body: &str,
        attributes: &BTreeMap<String, TypedAttribute>,
    ) -> Result<String, PlatformError> {
        let message_attributes = to_sqs_attributes(attributes)?;
        let client = self.sqs_client.clone();
        let output = block_on(async move {
            client
                .send_message()
                .queue_url(queue_url)
                .message_body(body)
                .set_message_attributes(Some(message_attributes))
                .send()
                .await
        })
        .map_err(|error| platform_error("send_message", &error))?;
        Ok(output.message_id().unwrap_or_default().to_string())
    }
}

fn to_sqs_attributes(
    attributes: &BTreeMap<String, TypedAttribute>,
) -> Result<HashMap<String, MessageAttributeValue>, PlatformError> {
    attributes
        .iter()
        .map(|(name, attribute)| {
            let value = MessageAttributeValue::builder()
                .data_type(&attribute.data_type)
                .set_string_value(attribute.string_value.clone())
                .set_binary_value(
                    attribute
                        .binary_value
                        .as_ref()
                        .map(|value| Blob::new(value.as_bytes().to_vec())),
                )
                .build()
                .map_err(|error| {
                    PlatformError::other("send_message", format!("attribute `{name}`: {error}"))
                })?;
            Ok((name.clone(), value))
        })
        .collect()
}
