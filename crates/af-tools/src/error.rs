//! Error types for af-tools
//!
//! These never escape an adapter invocation; they describe why structured
//! output could not be used and end up as messages on a [`ToolOutcome`].
//!
//! [`ToolOutcome`]: crate::outcome::ToolOutcome

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    /// T001: Analyzer output is not the expected JSON document
    #[error("[T001] Malformed analyzer output: {0}")]
    MalformedOutput(String),

    /// T002: Analyzer reported its own failure in structured output
    #[error("[T002] Analyzer reported failure: {0}")]
    AnalyzerReported(String),

    /// T003: No test summary could be found in the engine output
    #[error("[T003] No test summary found in output")]
    NoTestSummary,
}

/// Result type alias for ToolError
pub type ToolResult<T> = Result<T, ToolError>;
