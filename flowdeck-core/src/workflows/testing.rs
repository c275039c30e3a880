use std::sync::Mutex;

use async_trait::async_trait;

use super::types::{CommandRunner, LaunchRequest, PickItem, Picker};
use crate::error::Result;
use crate::events::{Notifier, Severity};

#[derive(Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .expect("notifier lock")
            .iter()
            .filter(|(level, _)| *level == severity)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().expect("notifier lock").is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, severity: Severity, message: String) {
        self.entries
            .lock()
            .expect("notifier lock")
            .push((severity, message));
    }
}

#[derive(Default)]
pub struct RecordingRunner {
    requests: Mutex<Vec<LaunchRequest>>,
}

impl RecordingRunner {
    pub fn requests(&self) -> Vec<LaunchRequest> {
        self.requests.lock().expect("runner lock").clone()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, request: LaunchRequest) -> Result<()> {
        self.requests.lock().expect("runner lock").push(request);
        Ok(())
    }
}

/// Answers every prompt with a fixed choice and remembers what it was shown.
pub struct ScriptedPicker {
    choice: Option<usize>,
    shown: Mutex<Vec<Vec<PickItem>>>,
}

impl ScriptedPicker {
    pub fn choosing(choice: Option<usize>) -> Self {
        Self {
            choice,
            shown: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Vec<PickItem>> {
        self.shown.lock().expect("picker lock").clone()
    }
}

#[async_trait]
impl Picker for ScriptedPicker {
    async fn pick(&self, items: &[PickItem]) -> Result<Option<usize>> {
        self.shown.lock().expect("picker lock").push(items.to_vec());
        Ok(self.choice)
    }
}

pub fn write_file(path: &std::path::Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dirs");
    }
    std::fs::write(path, contents).expect("write fixture");
}
