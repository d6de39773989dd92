use serde::{Deserialize, Serialize};

pub const POLICY_VERSION: &str = "2012-10-17";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    pub action: String,
    pub resource: String,
}

/// Access policy document in the identity service's wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocument {
    /// Coarse send/receive access to every queue, granted for the session.
    pub fn queue_full_access() -> Self {
        Self {
            version: POLICY_VERSION.to_string(),
            statements: vec![PolicyStatement {
                effect: Effect::Allow,
                action: "sqs:*".to_string(),
                resource: "*".to_string(),
            }],
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Extracts the role name from an execution role ARN such as
/// `arn:aws:iam::123456789012:role/service-role/orders-handler-role`.
pub fn role_name_from_arn(role_arn: &str) -> Option<&str> {
    if !role_arn.starts_with("arn:") {
        return None;
    }
    let (_, path) = role_arn.split_once(":role/")?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
