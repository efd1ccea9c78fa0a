//! Capability listing.

use dc_admin::{LdapConfigurationHandler, TestMethodDescriptor};
use serde::Serialize;
use tabled::Tabled;

use crate::config::OutputFormat;
use crate::error::CliResult;
use crate::output::{self, info};

/// Test method row for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct TestMethodRow {
    /// Test id.
    pub id: String,
    /// What the test checks.
    pub description: String,
    /// Required fields.
    #[tabled(rename = "Required")]
    pub required: String,
    /// Optional fields.
    #[tabled(rename = "Optional")]
    pub optional: String,
}

impl From<TestMethodDescriptor> for TestMethodRow {
    fn from(descriptor: TestMethodDescriptor) -> Self {
        Self {
            id: descriptor.id,
            description: descriptor.description,
            required: descriptor.required_fields.join(", "),
            optional: descriptor.optional_fields.join(", "),
        }
    }
}

/// Prints the handler id and its test methods.
pub fn run_capabilities(handler: &LdapConfigurationHandler, format: OutputFormat) -> CliResult<()> {
    let capabilities = handler.capabilities();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&capabilities)?);
            Ok(())
        }
        OutputFormat::Text => {
            info(&format!("Handler: {}", capabilities.handler_id));
            let rows: Vec<TestMethodRow> = capabilities.test_methods.into_iter().map(TestMethodRow::from).collect();
            output::output(&rows, format)
        }
    }
}
