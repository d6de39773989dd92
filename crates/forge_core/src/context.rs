use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::tracking;

pub const DEFAULT_CONFIG_FILE: &str = "cdk.json";
pub const RESOURCE_SECTION_KEY: &str = "arns";

/// Logical resource name to ARN (a string, or a list of strings).
pub type Resources = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("stage cannot be empty")]
    EmptyStage,
    #[error("configuration has no `context` object")]
    MissingContext,
    #[error("configuration context is missing `{key}` or it is not a string")]
    MissingCoordinate { key: &'static str },
    #[error("Resources {group} not found in configuration")]
    MissingGroup { group: String },
    #[error("Resources {group} arns not found in configuration")]
    MissingResources { group: String },
}

/// Resolved deployment coordinates for one stage and resource group.
///
/// A `Context` is never mutated after construction. Commands build a fresh
/// one per invocation through [`with_context`].
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    stage: String,
    name: String,
    repo: String,
    region: String,
    account: String,
    bucket: String,
    resources: Resources,
}

impl Context {
    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// ARNs registered under `resource`, whether stored as a single string
    /// or as a list.
    pub fn resource_arns(&self, resource: &str) -> Vec<&str> {
        match self.resources.get(resource) {
            Some(Value::String(arn)) => vec![arn.as_str()],
            Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Namespaced identifier shared by every generated resource name.
    pub fn gen_id(&self, resource: &str) -> String {
        format!("{}-{}-{}", self.stage, self.name, resource)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Context(stage='{}', name='{}', repo='{}', region='{}', account='{}', bucket='{}', resources='{}')",
            self.stage,
            self.name,
            self.repo,
            self.region,
            self.account,
            self.bucket,
            Value::Object(self.resources.clone()),
        )
    }
}

pub fn resolve(stage: &str, group: &str) -> Result<Context, ContextError> {
    resolve_from_path(DEFAULT_CONFIG_FILE, stage, group)
}

/// Reads the configuration file on every call; nothing is cached so edits
/// are picked up by the next invocation.
pub fn resolve_from_path(
    path: impl AsRef<Path>,
    stage: &str,
    group: &str,
) -> Result<Context, ContextError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ContextError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_json::from_str(&raw).map_err(|source| ContextError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    resolve_from_document(&document, stage, group)
}

pub fn resolve_from_document(
    document: &Value,
    stage: &str,
    group: &str,
) -> Result<Context, ContextError> {
    if stage.trim().is_empty() {
        return Err(ContextError::EmptyStage);
    }

    let Some(context) = document.get("context").and_then(Value::as_object) else {
        return Err(ContextError::MissingContext);
    };

    let Some(group_entry) = context.get(group) else {
        return Err(ContextError::MissingGroup {
            group: group.to_string(),
        });
    };

    let Some(resources) = group_entry
        .get(RESOURCE_SECTION_KEY)
        .and_then(Value::as_object)
    else {
        return Err(ContextError::MissingResources {
            group: group.to_string(),
        });
    };

    Ok(Context {
        stage: stage.to_string(),
        name: coordinate(context, "name")?,
        repo: coordinate(context, "repo")?,
        region: coordinate(context, "region")?,
        account: coordinate(context, "account")?,
        bucket: coordinate(context, "bucket")?,
        resources: resources.clone(),
    })
}

fn coordinate(context: &Map<String, Value>, key: &'static str) -> Result<String, ContextError> {
    context
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ContextError::MissingCoordinate { key })
}

/// Runs `command` with a freshly resolved [`Context`].
///
/// Tracking state is reset before resolution so that nothing recorded by an
/// earlier command in the same process leaks into this one.
pub fn with_context<R>(
    path: impl AsRef<Path>,
    stage: &str,
    group: &str,
    command: impl FnOnce(Context) -> R,
) -> Result<R, ContextError> {
    tracking::reset();
    let context = resolve_from_path(path, stage, group)?;
    tracing::debug!(%context, "resolved context");
    Ok(command(context))
}
