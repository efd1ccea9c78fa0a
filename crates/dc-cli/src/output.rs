//! Output formatting utilities.

use colored::Colorize;
use dc_admin::{ConfigurationMessage, MessageType, ProbeReport, TestReport};
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use crate::config::OutputFormat;
use crate::error::CliResult;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Outputs rows in the specified format.
pub fn output<T: Tabled + serde::Serialize>(data: &[T], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Text => {
            if data.is_empty() {
                info("No results found.");
            } else {
                let table = Table::new(data).with(Style::rounded()).to_string();
                println!("{table}");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data)?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Outputs a test or persist report.
pub fn test_report(report: &TestReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Text => print_messages(&report.messages),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

/// Outputs a probe report.
pub fn probe_report(report: &ProbeReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Text => {
            print_messages(&report.messages);
            for (key, value) in &report.probe_results {
                if value.is_object() || value.is_array() {
                    println!("{}:", key.bold());
                    print_value(value, 1);
                } else {
                    println!("{}: {}", key.bold(), scalar(value));
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

/// Renders one message as a single line.
#[must_use]
pub fn message_line(message: &ConfigurationMessage) -> String {
    let mut line = message.message_type.as_str().to_string();
    if let Some(field) = &message.config_id {
        line.push_str(&format!(" [{field}]"));
    }
    if let Some(text) = &message.message {
        line.push_str(&format!(" {text}"));
    }
    line
}

fn print_messages(messages: &[ConfigurationMessage]) {
    for message in messages {
        let line = message_line(message);
        match message.message_type {
            MessageType::Success => success(&line),
            _ => error(&line),
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Prints a JSON value as indented text.
fn print_value(value: &Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        Value::Array(items) => {
            for item in items {
                if item.is_object() {
                    println!("{prefix}-");
                    print_value(item, indent + 1);
                } else {
                    println!("{prefix}- {}", scalar(item));
                }
            }
        }
        Value::Object(map) => {
            for (key, val) in map {
                if val.is_object() || val.is_array() {
                    println!("{prefix}{key}:");
                    print_value(val, indent + 1);
                } else {
                    println!("{prefix}{key}: {}", scalar(val));
                }
            }
        }
        other => println!("{prefix}{}", scalar(other)),
    }
}
