//! Detail pane content for an expanded entry

use super::DetailTab;
use crate::logging::LogEntry;

/// Plain-text lines for `tab`; the widget only styles them
pub fn detail_lines(entry: &LogEntry, tab: DetailTab) -> Vec<String> {
    match tab {
        DetailTab::Formatted => formatted(entry),
        DetailTab::Raw => pretty(entry),
        DetailTab::Context => match &entry.context {
            Some(context) if !context.is_empty() => pretty(context),
            _ => vec!["No context".to_string()],
        },
        DetailTab::Error => match &entry.technical {
            Some(technical) => {
                let mut lines = vec![format!("Name: {}", technical.name)];
                if let Some(stack) = &technical.stack {
                    lines.push(String::new());
                    lines.extend(stack.lines().map(str::to_string));
                }
                if let Some(raw) = &technical.raw_error {
                    lines.push(String::new());
                    lines.extend(pretty(raw));
                }
                lines
            }
            None => vec!["No error details".to_string()],
        },
    }
}

fn formatted(entry: &LogEntry) -> Vec<String> {
    let mut lines = vec![
        format!("Time:    {}", entry.timestamp),
        format!("Level:   {}", entry.level),
        format!("Source:  {}", entry.source),
        format!("Message: {}", entry.message),
    ];
    if let Some(code) = &entry.code {
        lines.push(format!("Code:    {}", code));
    }
    if entry.is_retry() {
        lines.push("Retry:   yes".to_string());
    }
    if let Some(metadata) = &entry.metadata {
        lines.push(format!(
            "Device:  {} / {} / {} (v{})",
            metadata.browser, metadata.os, metadata.device_info, metadata.app_version
        ));
    }
    lines
}

fn pretty<T: serde::Serialize + ?Sized>(value: &T) -> Vec<String> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => json.lines().map(str::to_string).collect(),
        Err(e) => vec![format!("Cannot render: {}", e)],
    }
}
