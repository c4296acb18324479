use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Failure classes recognized across the gateway.
///
/// Configuration and Connection are startup-fatal; Validation, Security and
/// Execution are caught at the dispatch boundary and reported in-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Validation,
    Security,
    Execution,
}

impl ErrorKind {
    /// Stable wire code carried in rendered payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "CONFIGURATION_ERROR",
            ErrorKind::Connection => "CONNECTION_ERROR",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Security => "SECURITY_ERROR",
            ErrorKind::Execution => "TOOL_EXECUTION_ERROR",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Security => "SecurityError",
            ErrorKind::Execution => "ToolExecutionError",
        }
    }
}

/// Gateway-wide error record: a kind tag, a human-readable message and a
/// structured details map, constructed at the failure site.
#[derive(Debug, Clone, Error)]
#[error("{}: {}", .kind.code(), .message)]
pub struct McpError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Map<String, JsonValue>,
}

impl McpError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Security, message)
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Execution, message)
    }

    /// Attach one structured detail, builder-style.
    pub fn with_detail(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// JSON rendering used verbatim by dispatch error payloads and logs.
    pub fn to_json(&self) -> JsonValue {
        let mut obj = Map::new();
        obj.insert("name".into(), self.kind.name().into());
        obj.insert("message".into(), self.message.clone().into());
        obj.insert("code".into(), self.kind.code().into());
        if !self.details.is_empty() {
            obj.insert("details".into(), JsonValue::Object(self.details.clone()));
        }
        JsonValue::Object(obj)
    }

    /// One-line rendering of [`McpError::to_json`].
    pub fn render(&self) -> String {
        self.to_json().to_string()
    }
}
