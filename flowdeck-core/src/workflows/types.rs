use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// One parsed definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRecord {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub source_path: PathBuf,
}

/// The recognized fields of a definition file, before label resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefinitionFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub command: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub description: Option<String>,
}

impl From<&WorkflowRecord> for PickItem {
    fn from(record: &WorkflowRecord) -> Self {
        Self {
            label: record.label.clone(),
            description: record.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchRequest {
    pub command: String,
    pub working_dir: PathBuf,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Launched(LaunchRequest),
    NoWorkflows,
    Cancelled,
}

/// Lets the user choose one entry. `Ok(None)` means the prompt was dismissed.
#[async_trait]
pub trait Picker: Send + Sync {
    async fn pick(&self, items: &[PickItem]) -> Result<Option<usize>>;
}

/// Starts a launch request in a visible terminal or process. The outcome of
/// the launched command is not reported back.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, request: LaunchRequest) -> Result<()>;
}
