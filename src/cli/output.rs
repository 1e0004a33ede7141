//! Recipe serialization for the `detect` command.

use anyhow::{Context, Result};

use crate::recipe::Recipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (human-friendly, version-control friendly)
    Yaml,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self, recipe: &Recipe) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(recipe).context("Failed to serialize recipe to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(recipe).context("Failed to serialize recipe to YAML")
            }
        }
    }
}
