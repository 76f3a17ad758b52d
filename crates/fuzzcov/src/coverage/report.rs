//! Coverage Report Generation
//!
//! ```text
//! compilations + coverage ──► SourceAnalyzer ──► SourceAnalysis
//!                                                     │
//!                          parse HTML + JSON templates (no side effects yet)
//!                                                     │
//!                          create output directory    ▼
//!                          temp file ► write ► sync ► rename, per document
//! ```
//!
//! Both documents are rendered from the same analysis and the same timestamp.
//! A failure in one document never hides a failure in the other.

use super::analysis::{SourceAnalysis, SourceAnalyzer};
use super::config::ReportConfig;
use super::formatters::{
    HtmlFormatter, JsonFormatter, ReportDocument, HTML_REPORT_FILE, JSON_REPORT_FILE,
};
use crate::compilation::Compilation;
use crate::result::{FileOperation, FuzzcovError, FuzzcovResult};
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Locations of the written report documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// HTML report
    pub html: PathBuf,
    /// JSON report
    pub json: PathBuf,
}

/// Analyze coverage and write both reports into `output_dir`.
///
/// An empty `output_dir` runs the analysis but writes nothing.
///
/// # Errors
///
/// Returns the analyzer's error, a template error, or every document
/// write failure.
pub fn generate_report<A: SourceAnalyzer>(
    analyzer: &A,
    compilations: &[Arc<Compilation>],
    coverage: &A::Coverage,
    output_dir: &str,
    config: &ReportConfig,
) -> FuzzcovResult<()> {
    let analysis = analyzer.analyze(compilations, coverage)?;

    if output_dir.is_empty() {
        debug!("no coverage report directory configured, skipping export");
        return Ok(());
    }

    let _ = generate_report_from_analysis(&analysis, Path::new(output_dir), config)?;
    Ok(())
}

/// Write both reports for an existing analysis
///
/// # Errors
///
/// Returns a template error before touching the filesystem, a directory
/// error, or every document write failure.
pub fn generate_report_from_analysis(
    analysis: &SourceAnalysis,
    output_dir: &Path,
    config: &ReportConfig,
) -> FuzzcovResult<ReportPaths> {
    // One instant for both documents
    let mut config = config.clone();
    config.generated_at = Some(config.generated_at.unwrap_or_else(Local::now));

    let (html, json) = both(
        HtmlFormatter::new(analysis, &config),
        JsonFormatter::new(analysis, &config),
    )?;

    prepare_directory(output_dir)?;

    let documents: [&dyn ReportDocument; 2] = [&html, &json];
    let mut errors = Vec::new();
    for document in documents {
        if let Err(err) = write_document(output_dir, document) {
            warn!(document = document.file_name(), error = %err, "coverage report failed");
            errors.push(err);
        }
    }
    if let Some(err) = FuzzcovError::combine(errors) {
        return Err(err);
    }

    Ok(ReportPaths {
        html: output_dir.join(HTML_REPORT_FILE),
        json: output_dir.join(JSON_REPORT_FILE),
    })
}

fn both<T, U>(a: FuzzcovResult<T>, b: FuzzcovResult<U>) -> FuzzcovResult<(T, U)> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(err), Ok(_)) | (Ok(_), Err(err)) => Err(err),
        (Err(a), Err(b)) => Err(FuzzcovError::Documents { errors: vec![a, b] }),
    }
}

fn prepare_directory(dir: &Path) -> FuzzcovResult<()> {
    debug!(path = %dir.display(), "preparing coverage report directory");
    fs::create_dir_all(dir).map_err(|source| FuzzcovError::Directory {
        path: dir.to_path_buf(),
        source,
    })
}

/// Render a document and move it into place.
///
/// The temp file is removed on any failure, so the target only ever holds
/// a complete document.
fn write_document(dir: &Path, document: &dyn ReportDocument) -> FuzzcovResult<PathBuf> {
    let path = dir.join(document.file_name());
    info!(path = %path.display(), "writing coverage report");

    let contents = document.generate()?;
    let io_error = |operation, source| FuzzcovError::FileIo {
        path: path.clone(),
        operation,
        source,
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| io_error(FileOperation::Create, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(|e| io_error(FileOperation::Create, e))?;
    }
    file.write_all(contents.as_bytes())
        .map_err(|e| io_error(FileOperation::Write, e))?;
    file.flush().map_err(|e| io_error(FileOperation::Sync, e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| io_error(FileOperation::Sync, e))?;
    let _ = file
        .persist(&path)
        .map_err(|e| io_error(FileOperation::Persist, e.error))?;

    Ok(path)
}
