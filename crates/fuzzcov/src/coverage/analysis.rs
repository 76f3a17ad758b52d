//! Source Coverage Analysis
//!
//! Per-file, per-line coverage facts produced by an external analyzer from
//! raw coverage data and source maps. Report rendering only reads these.

use crate::compilation::Compilation;
use crate::result::FuzzcovResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Coverage facts for a single source line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLineAnalysis {
    /// Line contains coverable code
    pub is_active: bool,
    /// Byte offset of the line start in the source file
    pub start: usize,
    /// Byte offset one past the line end
    pub end: usize,
    /// Raw line contents
    pub contents: String,
    /// Executed in a call that did not revert
    pub is_covered: bool,
    /// Hits from calls that did not revert
    pub covered_count: u64,
    /// Executed in a call that reverted
    pub is_covered_reverted: bool,
    /// Hits from calls that reverted
    pub reverted_count: u64,
}

impl SourceLineAnalysis {
    /// An inactive line (comments, blank lines, declarations)
    #[must_use]
    pub fn inactive(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            ..Default::default()
        }
    }

    /// An active line with the given successful hit count
    #[must_use]
    pub fn active(contents: impl Into<String>, covered_count: u64) -> Self {
        Self {
            is_active: true,
            contents: contents.into(),
            is_covered: covered_count > 0,
            covered_count,
            ..Default::default()
        }
    }

    /// Record hits from reverted calls
    #[must_use]
    pub fn with_reverted(mut self, reverted_count: u64) -> Self {
        self.is_covered_reverted = reverted_count > 0;
        self.reverted_count = reverted_count;
        self
    }

    /// Covered by either a successful or a reverted call
    #[must_use]
    pub const fn is_any_covered(&self) -> bool {
        self.is_covered || self.is_covered_reverted
    }
}

/// Coverage facts for one source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFileAnalysis {
    /// Source path as known to the compilation
    pub path: String,
    /// Lines in file order
    pub lines: Vec<SourceLineAnalysis>,
}

impl SourceFileAnalysis {
    /// Create a file analysis
    #[must_use]
    pub fn new(path: impl Into<String>, lines: Vec<SourceLineAnalysis>) -> Self {
        Self {
            path: path.into(),
            lines,
        }
    }

    /// Number of lines containing coverable code
    #[must_use]
    pub fn active_line_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_active).count()
    }

    /// Number of active lines that were executed
    #[must_use]
    pub fn covered_line_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.is_active && l.is_any_covered())
            .count()
    }
}

/// Coverage facts for every analyzed source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAnalysis {
    /// Source path to its analysis
    pub files: BTreeMap<String, SourceFileAnalysis>,
}

impl SourceAnalysis {
    /// Create an empty analysis
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert(&mut self, file: SourceFileAnalysis) {
        let _ = self.files.insert(file.path.clone(), file);
    }

    /// Files ordered by path
    pub fn sorted_files(&self) -> impl Iterator<Item = &SourceFileAnalysis> {
        self.files.values()
    }

    /// Active lines across all files
    #[must_use]
    pub fn active_line_count(&self) -> usize {
        self.files.values().map(SourceFileAnalysis::active_line_count).sum()
    }

    /// Covered lines across all files
    #[must_use]
    pub fn covered_line_count(&self) -> usize {
        self.files.values().map(SourceFileAnalysis::covered_line_count).sum()
    }
}

/// Converts raw coverage data and compilations into a [`SourceAnalysis`]
pub trait SourceAnalyzer {
    /// Aggregated coverage data recorded by the instrumentation layer
    type Coverage: ?Sized;

    /// Analyze coverage for every source file in the compilations
    ///
    /// # Errors
    ///
    /// Returns [`crate::FuzzcovError::Analysis`] when the data cannot be mapped to sources.
    fn analyze(
        &self,
        compilations: &[Arc<Compilation>],
        coverage: &Self::Coverage,
    ) -> FuzzcovResult<SourceAnalysis>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample_file() -> SourceFileAnalysis {
        SourceFileAnalysis::new(
            "src/Token.sol",
            vec![
                SourceLineAnalysis::inactive("// SPDX"),
                SourceLineAnalysis::active("x = 1;", 3),
                SourceLineAnalysis::active("y = 2;", 0),
                SourceLineAnalysis::active("revert();", 0).with_reverted(2),
            ],
        )
    }

    #[test]
    fn test_file_counts() {
        let file = sample_file();
        assert_eq!(file.active_line_count(), 3);
        assert_eq!(file.covered_line_count(), 2);
    }

    #[test]
    fn test_reverted_counts_as_covered() {
        let line = SourceLineAnalysis::active("revert();", 0).with_reverted(1);
        assert!(!line.is_covered);
        assert!(line.is_any_covered());
    }

    #[test]
    fn test_analysis_totals_and_order() {
        let mut analysis = SourceAnalysis::new();
        analysis.insert(SourceFileAnalysis::new(
            "src/b.sol",
            vec![SourceLineAnalysis::active("a", 1)],
        ));
        analysis.insert(sample_file());

        assert_eq!(analysis.active_line_count(), 4);
        assert_eq!(analysis.covered_line_count(), 3);
        let paths: Vec<&str> = analysis.sorted_files().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/Token.sol", "src/b.sol"]);
    }

    #[test]
    fn test_empty_analysis() {
        let analysis = SourceAnalysis::new();
        assert_eq!(analysis.active_line_count(), 0);
        assert_eq!(analysis.covered_line_count(), 0);
    }
}
