//! HTML Coverage Report
//!
//! Self-contained interactive document: a summary, a per-file table, and one
//! collapsible source listing per file with every line classed as
//! `covered`, `reverted`, `uncovered` or `inactive`.

use super::ReportDocument;
use crate::coverage::analysis::{SourceAnalysis, SourceFileAnalysis, SourceLineAnalysis};
use crate::coverage::config::ReportConfig;
use crate::coverage::format::{escape_html, percentage_int, percentage_str, relative_path};
use crate::coverage::template::ReportTemplate;
use crate::result::FuzzcovResult;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt::Write;

/// File name of the HTML report
pub const HTML_REPORT_FILE: &str = "coverage_report.html";

const BUILTIN_TEMPLATE: &str = include_str!("../../../templates/report.html");

const SLOTS: &[&str] = &[
    "title",
    "generated_at",
    "coverage_percent",
    "coverage_int",
    "covered_lines",
    "active_lines",
    "file_count",
    "file_rows",
    "file_sections",
];

/// HTML report generator
#[derive(Debug)]
pub struct HtmlFormatter<'a> {
    analysis: &'a SourceAnalysis,
    template: ReportTemplate,
    title: String,
    decimals: usize,
    generated_at: DateTime<Local>,
}

impl<'a> HtmlFormatter<'a> {
    /// Parse the configured template and capture the report timestamp
    ///
    /// # Errors
    ///
    /// Returns error if the template does not parse
    pub fn new(analysis: &'a SourceAnalysis, config: &ReportConfig) -> FuzzcovResult<Self> {
        let source = config.html_template.as_deref().unwrap_or(BUILTIN_TEMPLATE);
        let template = ReportTemplate::parse(HTML_REPORT_FILE, source, SLOTS)?;
        Ok(Self {
            analysis,
            template,
            title: config.title.clone(),
            decimals: config.decimals,
            generated_at: config.generated_at.unwrap_or_else(Local::now),
        })
    }

    /// Render the full document
    #[must_use]
    pub fn render(&self) -> String {
        let covered = self.analysis.covered_line_count();
        let active = self.analysis.active_line_count();

        let mut values: HashMap<&str, String> = HashMap::new();
        let _ = values.insert("title", escape_html(&self.title));
        let _ = values.insert(
            "generated_at",
            self.generated_at.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        );
        let _ = values.insert(
            "coverage_percent",
            percentage_str(covered, active, self.decimals),
        );
        let _ = values.insert("coverage_int", percentage_int(covered, active).to_string());
        let _ = values.insert("covered_lines", covered.to_string());
        let _ = values.insert("active_lines", active.to_string());
        let _ = values.insert("file_count", self.analysis.files.len().to_string());
        let _ = values.insert("file_rows", self.file_rows());
        let _ = values.insert("file_sections", self.file_sections());

        self.template.render(&values)
    }

    fn file_rows(&self) -> String {
        let mut rows = String::new();
        for file in self.analysis.sorted_files() {
            let covered = file.covered_line_count();
            let active = file.active_line_count();
            let _ = writeln!(
                rows,
                r#"            <tr><td><a href="{anchor}">{path}</a></td><td>{covered} / {active}</td><td>{pct}%</td><td><div class="progress-bar"><div class="progress" style="width: {pct_int}%"></div></div></td></tr>"#,
                anchor = escape_html(&format!("#{}", anchor_id(&file.path))),
                path = escape_html(&relative_path(&file.path)),
                pct = percentage_str(covered, active, self.decimals),
                pct_int = percentage_int(covered, active),
            );
        }
        rows
    }

    fn file_sections(&self) -> String {
        let mut html = String::new();
        for file in self.analysis.sorted_files() {
            self.write_file_section(&mut html, file);
        }
        html
    }

    fn write_file_section(&self, html: &mut String, file: &SourceFileAnalysis) {
        let covered = file.covered_line_count();
        let active = file.active_line_count();

        let _ = writeln!(
            html,
            r#"    <details id="{id}">
        <summary>{path} ({covered} / {active} lines, {pct}%)</summary>
        <table class="source">"#,
            id = escape_html(&anchor_id(&file.path)),
            path = escape_html(&relative_path(&file.path)),
            pct = percentage_str(covered, active, self.decimals),
        );

        for (index, line) in file.lines.iter().enumerate() {
            let _ = writeln!(
                html,
                r#"            <tr class="{class}"><td class="num">{number}</td><td class="hits">{hits}</td><td><pre>{code}</pre></td></tr>"#,
                class = line_class(line),
                number = index + 1,
                hits = hit_label(line),
                code = escape_html(line.contents.trim_end_matches(&['\r', '\n'][..])),
            );
        }

        html.push_str("        </table>\n    </details>\n");
    }
}

impl ReportDocument for HtmlFormatter<'_> {
    fn file_name(&self) -> &'static str {
        HTML_REPORT_FILE
    }

    fn generate(&self) -> FuzzcovResult<String> {
        Ok(self.render())
    }
}

fn line_class(line: &SourceLineAnalysis) -> &'static str {
    if !line.is_active {
        "inactive"
    } else if line.is_covered {
        "covered"
    } else if line.is_covered_reverted {
        "reverted"
    } else {
        "uncovered"
    }
}

fn hit_label(line: &SourceLineAnalysis) -> String {
    if !line.is_active {
        return String::new();
    }
    if line.reverted_count > 0 {
        format!("{} ({} reverted)", line.covered_count, line.reverted_count)
    } else {
        line.covered_count.to_string()
    }
}

/// Stable element id for a source path.
///
/// ASCII alphanumerics pass through and every other byte becomes `-xx`, so
/// distinct paths never share an id.
fn anchor_id(path: &str) -> String {
    let mut id = String::from("file-");
    for byte in path.bytes() {
        if byte.is_ascii_alphanumeric() {
            id.push(char::from(byte));
        } else {
            let _ = write!(id, "-{byte:02x}");
        }
    }
    id
}
