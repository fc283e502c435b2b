//! Parsers for analyzer output

use crate::error::{ToolError, ToolResult};
use af_core::step::{Finding, Severity, TestSummary};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

#[derive(Debug, Deserialize)]
struct SlitherReport {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: SlitherResults,
}

#[derive(Debug, Default, Deserialize)]
struct SlitherResults {
    #[serde(default)]
    detectors: Vec<SlitherDetector>,
}

#[derive(Debug, Deserialize)]
struct SlitherDetector {
    #[serde(default)]
    check: String,
    #[serde(default)]
    impact: String,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    first_markdown_element: Option<String>,
    #[serde(default)]
    elements: Vec<SlitherElement>,
}

#[derive(Debug, Deserialize)]
struct SlitherElement {
    #[serde(default)]
    source_mapping: Option<SourceMapping>,
}

#[derive(Debug, Deserialize)]
struct SourceMapping {
    #[serde(default)]
    filename_relative: Option<String>,
    #[serde(default)]
    lines: Vec<u64>,
}

impl SlitherDetector {
    fn location(&self) -> Option<String> {
        if let Some(md) = self.first_markdown_element.as_deref().filter(|s| !s.is_empty()) {
            return Some(md.to_string());
        }
        let mapping = self.elements.iter().find_map(|e| e.source_mapping.as_ref())?;
        let file = mapping.filename_relative.as_deref()?;
        Some(match mapping.lines.first() {
            Some(line) => format!("{}#L{}", file, line),
            None => file.to_string(),
        })
    }

    fn into_finding(self) -> Finding {
        let location = self.location();
        Finding {
            severity: Severity::from_label(&self.impact),
            check: self.check,
            confidence: self.confidence,
            location,
            description: self.description.trim().to_string(),
        }
    }
}

/// Parse the static analyzer's JSON report into findings.
///
/// Returns [`ToolError::AnalyzerReported`] when the document is well formed
/// but declares `success: false`.
pub fn parse_static_report(stdout: &str) -> ToolResult<Vec<Finding>> {
    let body = stdout.trim();
    if body.is_empty() {
        return Err(ToolError::MalformedOutput("empty output".to_string()));
    }
    let report: SlitherReport =
        serde_json::from_str(body).map_err(|e| ToolError::MalformedOutput(e.to_string()))?;

    if !report.success {
        return Err(ToolError::AnalyzerReported(
            report.error.unwrap_or_else(|| "no error message".to_string()),
        ));
    }

    Ok(report
        .results
        .detectors
        .into_iter()
        .map(SlitherDetector::into_finding)
        .collect())
}

static TOTAL_RE: OnceLock<Regex> = OnceLock::new();
static SUITE_RE: OnceLock<Regex> = OnceLock::new();

fn total_re() -> &'static Regex {
    TOTAL_RE.get_or_init(|| {
        Regex::new(r"(\d+) tests? passed, (\d+) failed, (\d+) skipped").expect("valid regex")
    })
}

fn suite_re() -> &'static Regex {
    SUITE_RE.get_or_init(|| {
        Regex::new(r"Suite result: \w+\. (\d+) passed; (\d+) failed; (\d+) skipped")
            .expect("valid regex")
    })
}

fn capture_u32(caps: &regex::Captures<'_>, idx: usize) -> u32 {
    caps.get(idx)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

/// Extract pass/fail counts from the test engine's console output.
///
/// Prefers the multi-suite total line and falls back to summing per-suite
/// result lines.
pub fn parse_test_summary(output: &str) -> ToolResult<TestSummary> {
    if let Some(caps) = total_re().captures_iter(output).last() {
        return Ok(TestSummary {
            passed: capture_u32(&caps, 1),
            failed: capture_u32(&caps, 2),
            skipped: capture_u32(&caps, 3),
        });
    }

    let mut summary = None::<TestSummary>;
    for caps in suite_re().captures_iter(output) {
        let s = summary.get_or_insert_with(TestSummary::default);
        s.passed += capture_u32(&caps, 1);
        s.failed += capture_u32(&caps, 2);
        s.skipped += capture_u32(&caps, 3);
    }
    summary.ok_or(ToolError::NoTestSummary)
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
