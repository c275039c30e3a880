pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod workflows;

use std::sync::Arc;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{Event, EventBus, Notifier, Severity};
pub use workflows::{
    CommandRunner, LaunchOutcome, LaunchRequest, PickItem, Picker, ShellRunner, WorkflowLauncher,
    WorkflowRecord, WorkflowRegistry,
};

/// Explicitly owned application state: one registry plus the event bus its
/// notifications go through.
pub struct Flowdeck {
    config: Config,
    events: EventBus,
    registry: Arc<WorkflowRegistry>,
}

impl Flowdeck {
    pub fn new(config: Config) -> Result<Self> {
        config::validate_config(&config)?;
        let events = EventBus::default();
        let registry = Arc::new(WorkflowRegistry::new(
            config.clone(),
            Arc::new(events.clone()),
            events.clone(),
        ));

        Ok(Self {
            config,
            events,
            registry,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn registry(&self) -> &Arc<WorkflowRegistry> {
        &self.registry
    }

    pub fn launcher(&self, picker: Arc<dyn Picker>, runner: Arc<dyn CommandRunner>) -> WorkflowLauncher {
        WorkflowLauncher::new(
            self.config.launch.clone(),
            picker,
            runner,
            Arc::new(self.events.clone()),
        )
    }

    pub fn shell_runner(&self) -> ShellRunner {
        ShellRunner::new(self.config.launch.wait_for_exit)
    }

    /// Stops watching. The registry is also disposed when dropped.
    pub fn shutdown(&self) {
        self.registry.dispose();
    }
}
