//! Coverage report synthesis
//!
//! Turns a [`SourceAnalysis`] (per-file, per-line coverage facts computed by
//! an external analyzer) into two synchronized documents:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  SourceAnalyzer ─► SourceAnalysis ─┬─► HtmlFormatter ─► .html  │
//! │                                    └─► JsonFormatter ─► .json  │
//! │                    shared helpers: format::{percentage_*, ...} │
//! └────────────────────────────────────────────────────────────────┘
//! ```

mod analysis;
mod config;
pub mod format;
pub mod formatters;
mod report;
mod template;

pub use analysis::{SourceAnalysis, SourceAnalyzer, SourceFileAnalysis, SourceLineAnalysis};
pub use config::ReportConfig;
pub use formatters::{
    HtmlFormatter, JsonFormatter, ReportDocument, HTML_REPORT_FILE, JSON_REPORT_FILE,
};
pub use report::{generate_report, generate_report_from_analysis, ReportPaths};
pub use template::ReportTemplate;
