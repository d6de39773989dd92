use forge_core::policy::{role_name_from_arn, PolicyDocument};
use tracing::info;

use crate::adapters::function::FunctionService;
use crate::adapters::identity::IdentityService;
use crate::error::{LiveError, PlatformError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantResult {
    pub role_name: String,
    pub policy_name: String,
    pub newly_attached: bool,
}

/// Adds access policies to a function's execution role.
///
/// Grants are additive: the policy is written under its own name and never
/// replaces anything else attached to the role.
pub struct PermissionGrantor<'a> {
    functions: &'a dyn FunctionService,
    identity: &'a dyn IdentityService,
    policy_name: String,
}

impl<'a> PermissionGrantor<'a> {
    pub fn new(
        functions: &'a dyn FunctionService,
        identity: &'a dyn IdentityService,
        policy_name: impl Into<String>,
    ) -> Self {
        Self {
            functions,
            identity,
            policy_name: policy_name.into(),
        }
    }

    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }

    pub fn attach_policy(
        &self,
        policy: &PolicyDocument,
        function_arn: &str,
    ) -> Result<GrantResult, LiveError> {
        let role_name = self.resolve_role_name(function_arn)?;
        let document = policy
            .to_json()
            .map_err(|error| PlatformError::other("put_role_policy", error.to_string()))?;

        // Putting an inline policy overwrites silently, so presence is read first.
        let existed = self
            .identity
            .role_policy_exists(&role_name, &self.policy_name)?;
        self.identity
            .put_role_policy(&role_name, &self.policy_name, &document)?;
        let newly_attached = !existed;

        info!(role = %role_name, policy = %self.policy_name, newly_attached, "policy granted");
        Ok(GrantResult {
            role_name,
            policy_name: self.policy_name.clone(),
            newly_attached,
        })
    }

    fn resolve_role_name(&self, function_arn: &str) -> Result<String, LiveError> {
        let role_arn = self
            .functions
            .function_role_arn(function_arn)
            .map_err(|error| LiveError::Permission {
                function: function_arn.to_string(),
                message: error.to_string(),
            })?;
        role_name_from_arn(&role_arn)
            .map(str::to_string)
            .ok_or_else(|| LiveError::Permission {
                function: function_arn.to_string(),
                message: format!("malformed role ARN `{role_arn}`"),
            })
    }
}
