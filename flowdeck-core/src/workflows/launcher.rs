use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::registry::WorkflowRegistry;
use super::types::{CommandRunner, LaunchOutcome, LaunchRequest, PickItem, Picker, WorkflowRecord};
use crate::config::schema::LaunchConfig;
use crate::error::{Error, Result};
use crate::events::{Notifier, Severity};

pub struct WorkflowLauncher {
    config: LaunchConfig,
    picker: Arc<dyn Picker>,
    runner: Arc<dyn CommandRunner>,
    notifier: Arc<dyn Notifier>,
}

impl WorkflowLauncher {
    pub fn new(
        config: LaunchConfig,
        picker: Arc<dyn Picker>,
        runner: Arc<dyn CommandRunner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            picker,
            runner,
            notifier,
        }
    }

    /// Launches `record`, or asks the picker for one from the registry's
    /// current list when none is given.
    pub async fn launch(
        &self,
        registry: &WorkflowRegistry,
        record: Option<WorkflowRecord>,
    ) -> Result<LaunchOutcome> {
        let record = match record {
            Some(record) => record,
            None => {
                let records = registry.records();
                if records.is_empty() {
                    self.notifier.notify(
                        Severity::Info,
                        "No workflows found. Add definition files to the workflow directory."
                            .to_owned(),
                    );
                    return Ok(LaunchOutcome::NoWorkflows);
                }

                let items = records.iter().map(PickItem::from).collect::<Vec<_>>();
                let Some(index) = self.picker.pick(&items).await? else {
                    return Ok(LaunchOutcome::Cancelled);
                };
                records.get(index).cloned().ok_or_else(|| {
                    Error::NotFound(format!("no workflow at selection index {index}"))
                })?
            }
        };

        let request = self.build_request(&record)?;
        info!(
            title = %request.title,
            command = %request.command,
            working_dir = %request.working_dir.display(),
            "launching workflow"
        );
        self.runner.run(request.clone()).await?;
        Ok(LaunchOutcome::Launched(request))
    }

    pub fn build_request(&self, record: &WorkflowRecord) -> Result<LaunchRequest> {
        let working_dir = record
            .source_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| {
                Error::Launch(format!(
                    "workflow '{}' has no parent directory",
                    record.source_path.display()
                ))
            })?
            .to_path_buf();

        let command = match record.command.as_deref() {
            Some(command) => command.to_owned(),
            None => default_command(&self.config.default_program, &record.source_path),
        };

        Ok(LaunchRequest {
            command,
            working_dir,
            title: format!("{}: {}", self.config.title_prefix, record.label),
        })
    }
}

pub fn default_command(program: &str, source_path: &Path) -> String {
    format!(
        "{} {}",
        program.trim(),
        quote_argument(&source_path.to_string_lossy())
    )
}

/// Double-quotes a single shell argument for the platform shell.
pub fn quote_argument(value: &str) -> String {
    if cfg!(windows) {
        return format!("\"{}\"", value.replace('"', "\"\""));
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if matches!(ch, '"' | '\\' | '$' | '`') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}
