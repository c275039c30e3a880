use std::path::Path;

use tracing::{debug, warn};

use super::types::{DefinitionFields, DefinitionFormat, WorkflowRecord};
use crate::config::schema::RegistryConfig;
use crate::events::{Notifier, Severity};

pub fn definition_format(path: &Path, config: &RegistryConfig) -> DefinitionFormat {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or_default();
    if config.is_json_extension(ext) {
        DefinitionFormat::Json
    } else {
        DefinitionFormat::Yaml
    }
}

/// Decodes a definition body. Blank input and non-mapping documents yield
/// empty fields; only syntax errors are reported.
pub fn decode_definition(
    raw: &str,
    format: DefinitionFormat,
) -> std::result::Result<DefinitionFields, String> {
    if raw.trim().is_empty() {
        return Ok(DefinitionFields::default());
    }

    match format {
        DefinitionFormat::Json => {
            let value = serde_json::from_str::<serde_json::Value>(raw)
                .map_err(|err| err.to_string())?;
            Ok(fields_from_json(&value))
        }
        DefinitionFormat::Yaml => {
            let value = serde_yaml::from_str::<serde_yaml::Value>(raw)
                .map_err(|err| err.to_string())?;
            Ok(fields_from_yaml(&value))
        }
    }
}

fn fields_from_json(value: &serde_json::Value) -> DefinitionFields {
    let Some(map) = value.as_object() else {
        return DefinitionFields::default();
    };
    let field = |key: &str| {
        map.get(key)
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned)
    };

    DefinitionFields {
        name: field("name"),
        description: field("description"),
        command: field("command"),
    }
}

fn fields_from_yaml(value: &serde_yaml::Value) -> DefinitionFields {
    let Some(map) = value.as_mapping() else {
        return DefinitionFields::default();
    };
    let field = |key: &str| {
        map.get(key)
            .and_then(serde_yaml::Value::as_str)
            .map(ToOwned::to_owned)
    };

    DefinitionFields {
        name: field("name"),
        description: field("description"),
        command: field("command"),
    }
}

pub fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn build_record(path: &Path, fields: DefinitionFields) -> WorkflowRecord {
    let label = fields
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| file_label(path));
    let command = fields
        .command
        .filter(|command| !command.trim().is_empty());

    WorkflowRecord {
        label,
        description: fields.description,
        command,
        source_path: path.to_path_buf(),
    }
}

/// Reads and parses one definition file. Always yields a record: unreadable
/// files count as empty and syntax errors raise one warning notification.
pub async fn parse_definition_file(
    path: &Path,
    config: &RegistryConfig,
    notifier: &dyn Notifier,
) -> WorkflowRecord {
    let raw = match tokio::fs::read(path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            warn!(path = %path.display(), "failed reading workflow definition: {err}");
            return build_record(path, DefinitionFields::default());
        }
    };

    let format = definition_format(path, config);
    let fields = match decode_definition(&raw, format) {
        Ok(fields) => fields,
        Err(err) => {
            notifier.notify(
                Severity::Warning,
                format!(
                    "failed to parse workflow definition '{}': {err}",
                    file_label(path)
                ),
            );
            DefinitionFields::default()
        }
    };

    let record = build_record(path, fields);
    debug!(path = %path.display(), label = %record.label, "parsed workflow definition");
    record
}
