//! af-core - Core library for Auditflow
//!
//! This crate provides the shared types used across the audit pipeline:
//! configuration parsing, the in-scope source model and its exclusion rules,
//! the import/inheritance dependency graph, and the analysis step model that
//! tool adapters and the orchestrator record their outcomes into.

pub mod atomic;
pub mod checksum;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod graph;
pub mod imports;
pub(crate) mod serde_helpers;
pub mod source;
pub mod step;

pub use atomic::{write_atomic, write_json_atomic};
pub use checksum::compute_checksum;
pub use config::{
    ChainConfig, Config, DynamicTesterConfig, IndexConfig, StaticAnalyzerConfig, ToolsConfig,
};
pub use error::{CoreError, CoreResult};
pub use exclusion::ExclusionSet;
pub use graph::{CyclePair, DependencyGraph, DependencyReport, ImportEdge, RankedFile};
pub use imports::{ContractDecl, ContractKind, ParsedFile};
pub use source::{normalize_relative, ContractProject, SourceFile};
pub use step::{
    AnalysisStep, FailureKind, Finding, PhaseOutcome, PhaseStatus, Severity, StepKind, StepStatus,
    TestSummary,
};
