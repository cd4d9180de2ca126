//! Log entry construction
//!
//! Turns a logging call into a fully enriched `LogEntry`. Every enrichment
//! step is best-effort: building an entry never fails.

use super::context::{
    browser_family, device_class, os_family, RuntimeContext, SERVER_PLACEHOLDER,
};
use super::entry::{DeviceMetadata, LogContext, LogEntry, LogLevel, TechnicalDetails, UserRef};
use super::sanitize::sanitize_error_payload;
use crate::clock::Clock;
use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Error supplied alongside a log call
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    pub stack: Option<String>,
    /// Raw payload, sanitized before it is attached
    pub details: Value,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let details = serde_json::json!({ "name": name, "message": message });
        Self {
            name,
            message,
            stack: None,
            details,
        }
    }

    /// Capture a Rust error: short type name, Display text and source chain
    ///
    /// A backtrace is attached when `RUST_BACKTRACE` enables capture.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let name = short_type_name(std::any::type_name::<E>());
        Self::describe(name, err)
    }

    fn describe(name: String, err: &dyn std::error::Error) -> Self {
        let message = err.to_string();
        let mut causes = Vec::new();
        let mut cursor = err.source();
        while let Some(cause) = cursor {
            causes.push(Value::String(cause.to_string()));
            cursor = cause.source();
        }

        let mut details = serde_json::json!({ "name": name, "message": message });
        if !causes.is_empty() {
            details["causes"] = Value::Array(causes);
        }

        let backtrace = Backtrace::capture();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            name,
            message,
            stack,
            details,
        }
    }

    /// Arbitrary JSON error payload (e.g. an HTTP error body)
    pub fn from_value(name: impl Into<String>, details: Value) -> Self {
        let message = details
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            name: name.into(),
            message,
            stack: None,
            details,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Optional parts of a logging call
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub error: Option<ErrorInfo>,
    pub code: Option<String>,
    pub data: Option<Value>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Builds enriched entries
pub struct EntryBuilder {
    clock: Arc<dyn Clock>,
    runtime: Arc<dyn RuntimeContext>,
    app_version: String,
    redact_stacks: bool,
    custom_filters: BTreeMap<String, String>,
}

impl EntryBuilder {
    pub fn new(
        clock: Arc<dyn Clock>,
        runtime: Arc<dyn RuntimeContext>,
        app_version: impl Into<String>,
        redact_stacks: bool,
        custom_filters: BTreeMap<String, String>,
    ) -> Self {
        Self {
            clock,
            runtime,
            app_version: app_version.into(),
            redact_stacks,
            custom_filters,
        }
    }

    pub fn build(
        &self,
        level: LogLevel,
        source: &str,
        message: &str,
        options: &LogOptions,
    ) -> LogEntry {
        let mut entry = LogEntry::new(self.clock.timestamp(), level, source, message);
        entry.code = options.code.clone();

        let context = self.context(options.data.as_ref());
        if !context.is_empty() {
            entry.context = Some(context);
        }

        entry.technical = options.error.as_ref().map(|e| self.technical(e));
        entry.metadata = Some(self.metadata());

        if !self.custom_filters.is_empty() {
            entry.filters = Some(self.custom_filters.clone());
        }

        entry
    }

    fn context(&self, data: Option<&Value>) -> LogContext {
        LogContext {
            url: self.runtime.current_url(),
            route: self.runtime.current_route(),
            user: self
                .runtime
                .membership_id()
                .map(|membership_id| UserRef { membership_id }),
            action: data
                .and_then(|d| d.get("action"))
                .and_then(Value::as_str)
                .map(str::to_string),
            additional_data: data.cloned(),
            is_retry: None,
            retry_timestamp: None,
        }
    }

    fn technical(&self, error: &ErrorInfo) -> TechnicalDetails {
        let name = if error.name.is_empty() {
            "Error".to_string()
        } else {
            error.name.clone()
        };
        let raw = sanitize_error_payload(&error.details, &name, &error.message);

        TechnicalDetails {
            stack: if self.redact_stacks {
                None
            } else {
                error.stack.clone()
            },
            raw_error: (!raw.is_null()).then_some(raw),
            name,
        }
    }

    fn metadata(&self) -> DeviceMetadata {
        match self.runtime.user_agent() {
            Some(ua) => DeviceMetadata {
                browser: browser_family(&ua).to_string(),
                os: os_family(&ua).to_string(),
                device_info: device_class(&ua).to_string(),
                app_version: self.app_version.clone(),
            },
            None => DeviceMetadata {
                browser: SERVER_PLACEHOLDER.to_string(),
                os: SERVER_PLACEHOLDER.to_string(),
                device_info: SERVER_PLACEHOLDER.to_string(),
                app_version: self.app_version.clone(),
            },
        }
    }
}
