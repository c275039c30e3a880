use crate::cli::OutputFormat;
use flowdeck_core::{Event, LaunchRequest, Severity, WorkflowRecord};

pub struct Renderer {
    output_format: OutputFormat,
}

impl Renderer {
    pub fn new(output_format: OutputFormat) -> Self {
        Self { output_format }
    }

    pub fn render_event(&self, event: &Event) {
        match self.output_format {
            OutputFormat::Text => self.render_text(event),
            OutputFormat::Json => self.render_json(event),
        }
    }

    fn render_text(&self, event: &Event) {
        match event {
            Event::Notification {
                severity: Severity::Info,
                message,
            } => println!("[info] {message}"),
            Event::Notification {
                severity: Severity::Warning,
                message,
            } => eprintln!("[warning] {message}"),
            Event::RecordsUpdated { count } => println!("[workflows] {count} found"),
        }
    }

    fn render_json(&self, event: &Event) {
        let output = match event {
            Event::Notification { severity, message } => serde_json::json!({
                "type": "notification",
                "severity": severity,
                "message": message
            }),
            Event::RecordsUpdated { count } => serde_json::json!({
                "type": "records_updated",
                "count": count
            }),
        };

        println!("{}", serde_json::to_string(&output).unwrap_or_default());
    }

    pub fn render_records(&self, records: &[WorkflowRecord]) {
        match self.output_format {
            OutputFormat::Text => {
                if records.is_empty() {
                    println!("No workflows found.");
                    return;
                }
                for line in text_lines(records) {
                    println!("{line}");
                }
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "type": "workflows",
                    "workflows": records
                });
                println!("{}", serde_json::to_string(&output).unwrap_or_default());
            }
        }
    }

    pub fn render_launch(&self, request: &LaunchRequest) {
        match self.output_format {
            OutputFormat::Text => {
                println!("[launch] {}", request.title);
                println!("  $ {}", request.command);
                println!("  in {}", request.working_dir.display());
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "type": "launch",
                    "request": request
                });
                println!("{}", serde_json::to_string(&output).unwrap_or_default());
            }
        }
    }
}

fn text_lines(records: &[WorkflowRecord]) -> Vec<String> {
    let mut lines = Vec::new();
    for record in records {
        match &record.description {
            Some(description) => lines.push(format!("- {} ({description})", record.label)),
            None => lines.push(format!("- {}", record.label)),
        }
        lines.push(format!(
            "  command: {}",
            record.command.as_deref().unwrap_or("<default>")
        ));
        lines.push(format!("  path: {}", record.source_path.display()));
    }
    lines
}
