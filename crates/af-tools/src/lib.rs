//! af-tools - External analyzer adapters for Auditflow
//!
//! Every supported analyzer is a variant of [`ToolAdapter`]. An invocation
//! always returns a classified [`ToolOutcome`]; process failures, timeouts and
//! malformed output are captured, never propagated.

pub mod adapter;
pub mod dynamic_tester;
pub mod error;
pub mod outcome;
pub mod parse;
pub mod process;
pub mod static_analyzer;

#[cfg(test)]
pub(crate) mod test_utils;

pub use adapter::{InvokeOptions, ToolAdapter, ToolAvailability, ToolKind};
pub use af_core::step::FailureKind as ToolFailure;
pub use dynamic_tester::{DynamicPhase, DynamicTester};
pub use error::{ToolError, ToolResult};
pub use outcome::ToolOutcome;
pub use process::{CommandSpec, ExitKind, ProcessOutput, ProcessRunner};
pub use static_analyzer::StaticAnalyzer;
