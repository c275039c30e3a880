pub mod collation;
pub mod discovery;
pub mod launcher;
pub mod parser;
pub mod registry;
pub mod runner;
pub mod types;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use launcher::WorkflowLauncher;
pub use registry::WorkflowRegistry;
pub use runner::ShellRunner;
pub use types::{
    CommandRunner, DefinitionFields, DefinitionFormat, LaunchOutcome, LaunchRequest, PickItem,
    Picker, WorkflowRecord,
};
pub use watcher::{WatchEvent, WatchSubscription};
