//! Report and message types returned to the invoking transport.
//!
//! A report with no failure messages is a success; a report is never
//! judged by its payload alone.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// The operation succeeded.
    Success,
    /// The operation failed.
    Failure,
    /// A required field is missing or empty.
    RequiredFields,
    /// No test method has the requested id.
    NoTestFound,
    /// A field value could not be parsed.
    InvalidField,
}

impl MessageType {
    /// Returns the wire code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::RequiredFields => "REQUIRED_FIELDS",
            Self::NoTestFound => "NO_TEST_FOUND",
            Self::InvalidField => "INVALID_FIELD",
        }
    }

    /// Whether this code reports a problem.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::Success)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured message: a code, optional text and the field it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationMessage {
    /// Message code.
    #[serde(rename = "type")]
    pub message_type: MessageType,

    /// Human-readable text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Path of the configuration field concerned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_id: Option<String>,
}

impl ConfigurationMessage {
    /// Creates a message with no text.
    #[must_use]
    pub const fn new(message_type: MessageType) -> Self {
        Self {
            message_type,
            message: None,
            config_id: None,
        }
    }

    /// Creates a message with text.
    #[must_use]
    pub fn build(message_type: MessageType, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(message_type)
        }
    }

    /// Creates a `SUCCESS` message.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::build(MessageType::Success, message)
    }

    /// Creates a `FAILURE` message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::build(MessageType::Failure, message)
    }

    /// Creates a `REQUIRED_FIELDS` message for `field`.
    #[must_use]
    pub fn required_field(field: &str) -> Self {
        Self::build(MessageType::RequiredFields, "Field cannot be empty").config_id(field)
    }

    /// Tags the message with a field path.
    #[must_use]
    pub fn config_id(mut self, field: impl Into<String>) -> Self {
        self.config_id = Some(field.into());
        self
    }

    /// Whether this message reports a problem.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.message_type.is_failure()
    }
}

/// Result of a test or persist operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    /// Messages in the order they were produced.
    pub messages: Vec<ConfigurationMessage>,
}

impl TestReport {
    /// Creates a report from messages.
    #[must_use]
    pub const fn new(messages: Vec<ConfigurationMessage>) -> Self {
        Self { messages }
    }

    /// Creates a report with one message.
    #[must_use]
    pub fn single(message: ConfigurationMessage) -> Self {
        Self::new(vec![message])
    }

    /// Whether any message reports a problem.
    #[must_use]
    pub fn contains_failure_messages(&self) -> bool {
        self.messages.iter().any(ConfigurationMessage::is_failure)
    }

    /// Whether the operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.contains_failure_messages()
    }
}

/// Result of a probe: messages plus keyed results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    /// Messages in the order they were produced.
    pub messages: Vec<ConfigurationMessage>,

    /// Probe results by key.
    pub probe_results: BTreeMap<String, Value>,
}

impl ProbeReport {
    /// Creates a report from messages.
    #[must_use]
    pub fn new(messages: Vec<ConfigurationMessage>) -> Self {
        Self {
            messages,
            probe_results: BTreeMap::new(),
        }
    }

    /// Adds a result.
    #[must_use]
    pub fn with_result(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.probe_results.insert(key.to_string(), value.into());
        self
    }

    /// Gets a result.
    #[must_use]
    pub fn result(&self, key: &str) -> Option<&Value> {
        self.probe_results.get(key)
    }

    /// Whether any message reports a problem.
    #[must_use]
    pub fn contains_failure_messages(&self) -> bool {
        self.messages.iter().any(ConfigurationMessage::is_failure)
    }

    /// Whether the probe succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.contains_failure_messages()
    }
}

impl From<TestReport> for ProbeReport {
    fn from(report: TestReport) -> Self {
        Self::new(report.messages)
    }
}

/// Describes one test method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMethodDescriptor {
    /// Test id.
    pub id: String,
    /// What the test checks.
    pub description: String,
    /// Fields the test cannot run without.
    pub required_fields: Vec<String>,
    /// Fields the test reads when present.
    pub optional_fields: Vec<String>,
}

/// What a configuration handler offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesReport {
    /// Handler id.
    pub handler_id: String,
    /// Available test methods.
    pub test_methods: Vec<TestMethodDescriptor>,
}
