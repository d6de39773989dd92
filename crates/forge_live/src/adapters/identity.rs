use super::{block_on, platform_error};
use crate::error::{PlatformError, PlatformErrorKind};

pub trait IdentityService {
    /// Whether `role_name` already carries the inline policy `policy_name`.
    fn role_policy_exists(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<bool, PlatformError>;

    /// Attaches `policy_document` to `role_name` as the inline policy
    /// `policy_name`. Other policies on the role are left untouched.
    fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), PlatformError>;
}

pub struct AwsIdentityService {
    iam_client: aws_sdk_iam::Client,
}

impl AwsIdentityService {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            iam_client: aws_sdk_iam::Client::new(config),
        }
    }
}

impl IdentityService for AwsIdentityService {
    fn role_policy_exists(
        &self,
        role_name: &str,
        policy_name: &str,
    ) -> Result<bool, PlatformError> {
        let client = self.iam_client.clone();
        let lookup = block_on(async move {
            client
                .get_role_policy()
                .role_name(role_name)
                .policy_name(policy_name)
                .send()
                .await
        });
        match lookup {
            Ok(_) => Ok(true),
            Err(error) => {
                let error = platform_error("get_role_policy", &error);
                if error.kind == PlatformErrorKind::NotFound {
                    Ok(false)
                } else {
                    Err(error)
                }
            }
        }
    }

    fn put_role_policy(
        &self,
        role_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), PlatformError> {
        let client = self.iam_client.clone();
        block_on(async move {
            client
                .put_role_policy()
                .role_name(role_name)
                .policy_name(policy_name)
                .policy_document(policy_document)
                .send()
                .await
        })
        .map(|_| ())
        .map_err(|error| platform_error("put_role_policy", &error))
    }
}
