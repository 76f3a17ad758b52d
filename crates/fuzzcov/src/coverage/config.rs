//! Report configuration

use crate::result::FuzzcovResult;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Settings shared by the HTML and JSON reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Title shown at the top of the HTML report
    pub title: String,
    /// Decimal places for percentages in both documents
    pub decimals: usize,
    /// Replacement for the built-in HTML template
    pub html_template: Option<String>,
    /// Replacement for the built-in JSON template
    pub json_template: Option<String>,
    /// Fixed report timestamp (defaults to the time rendering starts)
    pub generated_at: Option<DateTime<Local>>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Coverage Report".to_string(),
            decimals: 2,
            html_template: None,
            json_template: None,
            generated_at: None,
        }
    }
}

impl ReportConfig {
    /// Create a config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from YAML. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the YAML is malformed
    pub fn from_yaml_str(yaml: &str) -> FuzzcovResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Set the report title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the number of decimal places for percentages
    #[must_use]
    pub const fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    /// Use a custom HTML template
    #[must_use]
    pub fn with_html_template(mut self, template: impl Into<String>) -> Self {
        self.html_template = Some(template.into());
        self
    }

    /// Use a custom JSON template
    #[must_use]
    pub fn with_json_template(mut self, template: impl Into<String>) -> Self {
        self.json_template = Some(template.into());
        self
    }

    /// Pin the report timestamp
    #[must_use]
    pub const fn with_generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = Some(at);
        self
    }
}
