use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Notification {
        severity: Severity,
        message: String,
    },
    /// The registry replaced its record list.
    RecordsUpdated {
        count: usize,
    },
}

/// User-facing message surface. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: String);
}
