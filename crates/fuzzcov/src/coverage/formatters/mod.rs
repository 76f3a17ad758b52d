//! Coverage Report Formatters
//!
//! HTML and JSON renderings of one [`SourceAnalysis`](super::SourceAnalysis).
//! Templates are parsed when a formatter is constructed, never while writing.

mod html;
mod json;

pub use html::{HtmlFormatter, HTML_REPORT_FILE};
pub use json::{JsonFormatter, JSON_REPORT_FILE};

use crate::result::FuzzcovResult;

/// A rendered report document
pub trait ReportDocument {
    /// File name inside the output directory
    fn file_name(&self) -> &'static str;

    /// Render the document contents
    ///
    /// # Errors
    ///
    /// Returns error if the document cannot be serialized
    fn generate(&self) -> FuzzcovResult<String>;
}
