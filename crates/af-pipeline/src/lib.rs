//! af-pipeline - Audit pipeline orchestrator for Auditflow
//!
//! [`Pipeline`] sequences the audit steps over a shared [`PipelineContext`],
//! applies the fatal/non-fatal policy, and hands the recorded steps to the
//! [`ReportAggregator`], which persists the final [`AuditReport`].

pub mod aggregate;
pub mod context;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod report;
pub mod request;
pub mod tokens;

pub use aggregate::ReportAggregator;
pub use context::{PipelineContext, SharedContext};
pub use error::{PipelineError, PipelineResult};
pub use index::{
    BasicIndexGenerator, CommandIndexGenerator, DefaultIndexGenerator, GeneratedIndex, IndexError,
    IndexGenerator, IndexMethod, IndexRequest,
};
pub use pipeline::Pipeline;
pub use report::{AuditReport, FetchSummary, IndexSummary, ReportStatus, ReportSummary};
pub use request::{AuditRequest, FetchRequest};
pub use tokens::{default_counter, ApproximateCounter, TiktokenCounter, TokenCounter};
