//! JSON Coverage Report
//!
//! Structured coverage data for downstream tooling.
//!
//! ## Layout
//!
//! ```text
//! {
//!   "generated_at": "2024-05-01T12:30:00+00:00",
//!   "summary": { "active_lines", "covered_lines", "coverage_percent", "file_count" },
//!   "files": [
//!     { "path", "active_lines", "covered_lines", "coverage_percent", "last_active_line",
//!       "lines": [ { "line", "active", "covered", "hits", "reverted_hits" } ] }
//!   ]
//! }
//! ```
//!
//! Line listings stop at the last active line; trailing comments and blank
//! lines carry no coverage.

use super::ReportDocument;
use crate::coverage::analysis::{SourceAnalysis, SourceFileAnalysis};
use crate::coverage::config::ReportConfig;
use crate::coverage::format::{last_active_index, percentage_str, relative_path};
use crate::coverage::template::ReportTemplate;
use crate::result::FuzzcovResult;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashMap;

/// File name of the JSON report
pub const JSON_REPORT_FILE: &str = "coverage_report.json";

const BUILTIN_TEMPLATE: &str = include_str!("../../../templates/report.json");

const SLOTS: &[&str] = &["generated_at", "summary", "files"];

#[derive(Debug, Serialize)]
struct JsonSummary {
    active_lines: usize,
    covered_lines: usize,
    coverage_percent: String,
    file_count: usize,
}

#[derive(Debug, Serialize)]
struct JsonFile {
    path: String,
    active_lines: usize,
    covered_lines: usize,
    coverage_percent: String,
    last_active_line: usize,
    lines: Vec<JsonLine>,
}

#[derive(Debug, Serialize)]
struct JsonLine {
    line: usize,
    active: bool,
    covered: bool,
    hits: u64,
    reverted_hits: u64,
}

/// JSON report generator
#[derive(Debug)]
pub struct JsonFormatter<'a> {
    analysis: &'a SourceAnalysis,
    template: ReportTemplate,
    decimals: usize,
    generated_at: DateTime<Local>,
}

impl<'a> JsonFormatter<'a> {
    /// Parse the configured template and capture the report timestamp
    ///
    /// # Errors
    ///
    /// Returns error if the template does not parse
    pub fn new(analysis: &'a SourceAnalysis, config: &ReportConfig) -> FuzzcovResult<Self> {
        let source = config.json_template.as_deref().unwrap_or(BUILTIN_TEMPLATE);
        let template = ReportTemplate::parse(JSON_REPORT_FILE, source, SLOTS)?;
        Ok(Self {
            analysis,
            template,
            decimals: config.decimals,
            generated_at: config.generated_at.unwrap_or_else(Local::now),
        })
    }

    /// Render the full document
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn render(&self) -> FuzzcovResult<String> {
        let covered = self.analysis.covered_line_count();
        let active = self.analysis.active_line_count();
        let summary = JsonSummary {
            active_lines: active,
            covered_lines: covered,
            coverage_percent: percentage_str(covered, active, self.decimals),
            file_count: self.analysis.files.len(),
        };
        let files: Vec<JsonFile> = self
            .analysis
            .sorted_files()
            .map(|file| self.file_entry(file))
            .collect();

        let mut values: HashMap<&str, String> = HashMap::new();
        let _ = values.insert(
            "generated_at",
            serde_json::to_string(&self.generated_at.to_rfc3339())?,
        );
        let _ = values.insert("summary", serde_json::to_string_pretty(&summary)?);
        let _ = values.insert("files", serde_json::to_string_pretty(&files)?);

        Ok(self.template.render(&values))
    }

    fn file_entry(&self, file: &SourceFileAnalysis) -> JsonFile {
        let covered = file.covered_line_count();
        let active = file.active_line_count();
        let shown = if active == 0 {
            0
        } else {
            last_active_index(file) + 1
        };

        let lines = file.lines[..shown]
            .iter()
            .enumerate()
            .map(|(index, line)| JsonLine {
                line: index + 1,
                active: line.is_active,
                covered: line.is_active && line.is_any_covered(),
                hits: line.covered_count,
                reverted_hits: line.reverted_count,
            })
            .collect();

        JsonFile {
            path: relative_path(&file.path),
            active_lines: active,
            covered_lines: covered,
            coverage_percent: percentage_str(covered, active, self.decimals),
            last_active_line: shown,
            lines,
        }
    }
}

impl ReportDocument for JsonFormatter<'_> {
    fn file_name(&self) -> &'static str {
        JSON_REPORT_FILE
    }

    fn generate(&self) -> FuzzcovResult<String> {
        self.render()
    }
}
