use super::{block_on, platform_error};
use crate::error::PlatformError;

pub trait FunctionService {
    /// ARN of the execution role the function assumes.
    fn function_role_arn(&self, function: &str) -> Result<String, PlatformError>;

    /// Connects `event_source_arn` to `function`, returning the mapping id.
    fn create_event_source_mapping(
        &self,
        event_source_arn: &str,
        function: &str,
    ) -> Result<String, PlatformError>;
}

pub struct AwsFunctionService {
    lambda_client: aws_sdk_lambda::Client,
}

impl AwsFunctionService {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            lambda_client: aws_sdk_lambda::Client::new(config),
        }
    }
}

impl FunctionService for AwsFunctionService {
    fn function_role_arn(&self, function: &str) -> Result<String, PlatformError> {
        let client = self.lambda_client.clone();
        let output = block_on(async move {
            client
                .get_function_configuration()
                .function_name(function)
                .send()
                .await
        })
        .map_err(|error| platform_error("get_function_configuration", &error))?;
        output.role().map(str::to_string).ok_or_else(|| {
            PlatformError::other("get_function_configuration", "function has no execution role")
        })
    }

    fn create_event_source_mapping(
        &self,
        event_source_arn: &str,
        function: &str,
    ) -> Result<String, PlatformError> {
        let client = self.lambda_client.clone();
        let output = block_on(async move {
            client
                .create_event_source_mapping()
                .event_source_arn(event_source_arn)
                .function_name(function)
                .send()
                .await
        })
        .map_err(|error| platform_error("create_event_source_mapping", &error))?;
        Ok(output.uuid().unwrap_or_default().to_string())
    }
}
