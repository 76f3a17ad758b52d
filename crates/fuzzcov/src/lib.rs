//! fuzzcov: contract identification and coverage reports for smart-contract fuzzing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  execution engine ──► Contracts::match_bytecode ──► Contract    │
//! │                                    (first registered wins)  │    │
//! │                              callable_methods / enable / disable │
//! │                                                                 │
//! │  compilations + coverage ──► coverage::generate_report          │
//! │                               ├─► coverage_report.html          │
//! │                               └─► coverage_report.json          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod compilation;
pub mod contracts;
pub mod coverage;
mod result;

pub use compilation::{AbiMethod, Compilation, CompiledContract, ContractAbi, SourceArtifact};
pub use contracts::{Contract, Contracts};
pub use coverage::{
    generate_report, generate_report_from_analysis, ReportConfig, ReportPaths, SourceAnalysis,
    SourceAnalyzer, SourceFileAnalysis, SourceLineAnalysis,
};
pub use result::{FileOperation, FuzzcovError, FuzzcovResult};
