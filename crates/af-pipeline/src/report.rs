//! The persisted audit report

use crate::index::IndexMethod;
use af_cache::Network;
use af_core::error::{CoreError, CoreResult};
use af_core::{write_json_atomic, AnalysisStep, DependencyReport, Severity, StepKind, TestSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Overall outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Every step succeeded
    Completed,
    /// Index succeeded but some later step failed, timed out or was skipped
    Partial,
    /// Index did not succeed; nothing downstream ran
    Failed,
}

/// The generated index artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub path: PathBuf,
    pub method: IndexMethod,
    pub file_count: usize,
    pub token_count: usize,
    pub token_counter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

/// The fetched on-chain source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchSummary {
    pub network: Network,
    pub address: String,
    pub contract_name: String,
    pub compiler_version: String,
    pub cache_entry: PathBuf,
    pub file_count: usize,
}

/// Figures derived from the recorded steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub finding_counts_by_severity: BTreeMap<Severity, usize>,
    pub total_findings: usize,
    pub tests_passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestSummary>,
    pub cycles_found: usize,
    pub external_dependency_count: usize,
    pub index_token_count: usize,
    pub recommendations: Vec<String>,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<StepKind>,
    pub project_root: PathBuf,
    /// Tree the tools analyzed (the cache entry when source was fetched)
    pub source_root: PathBuf,
    #[serde(with = "step_map")]
    pub steps: Vec<AnalysisStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_graph: Option<DependencyReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch: Option<FetchSummary>,
    pub summary: ReportSummary,
    pub report_path: PathBuf,
}

impl AuditReport {
    pub fn step(&self, kind: StepKind) -> Option<&AnalysisStep> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    /// Write the report atomically to `report_path`
    pub fn save(&self) -> CoreResult<()> {
        write_json_atomic(&self.report_path, self)
    }

    /// Read a persisted report
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Steps serialize as an ordered `name -> step` map
mod step_map {
    use af_core::AnalysisStep;
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(steps: &[AnalysisStep], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(steps.len()))?;
        for step in steps {
            map.serialize_entry(step.kind.as_str(), step)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<AnalysisStep>, D::Error> {
        struct StepsVisitor;

        impl<'de> Visitor<'de> for StepsVisitor {
            type Value = Vec<AnalysisStep>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of step name to step")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut steps = Vec::new();
                while let Some((_, step)) = access.next_entry::<String, AnalysisStep>()? {
                    steps.push(step);
                }
                Ok(steps)
            }
        }

        deserializer.deserialize_map(StepsVisitor)
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
