use super::*;
use crate::test_utils::fake_tool;
use af_core::config::{DynamicTesterConfig, StaticAnalyzerConfig};
use tempfile::TempDir;

fn tools(static_bin: &str, dynamic_bin: &str) -> Vec<ToolAdapter> {
    let config = ToolsConfig {
        static_analyzer: StaticAnalyzerConfig {
            binary: static_bin.to_string(),
            ..Default::default()
        },
        dynamic_tester: DynamicTesterConfig {
            binary: dynamic_bin.to_string(),
            ..Default::default()
        },
    };
    ToolAdapter::all(&config, &ProcessRunner::new(2))
}

#[test]
fn test_all_adapters_in_order() {
    let adapters = tools("slither", "forge");
    let kinds: Vec<ToolKind> = adapters.iter().map(ToolAdapter::kind).collect();
    assert_eq!(kinds, vec![ToolKind::StaticAnalyzer, ToolKind::DynamicTester]);
    assert_eq!(adapters[0].binary(), "slither");
    assert_eq!(adapters[1].binary(), "forge");
    assert_eq!(ToolKind::DynamicTester.to_string(), "dynamic_tester");
}

#[tokio::test]
async fn test_check_available_reports_version() {
    let bin = TempDir::new().unwrap();
    let slither = fake_tool(bin.path(), "slither", "echo '0.10.4'");
    let adapters = tools(&slither.to_string_lossy(), "/nonexistent/forge");

    let found = adapters[0].check_available().await;
    assert!(found.is_available());
    assert_eq!(found.version.as_deref(), Some("0.10.4"));

    let missing = adapters[1].check_available().await;
    assert!(!missing.is_available());
    assert_eq!(missing.tool, ToolKind::DynamicTester);
}

#[tokio::test]
async fn test_invoke_dispatches_to_variant() {
    let bin = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let slither = fake_tool(
        bin.path(),
        "slither",
        r#"echo '{"success": true, "error": null, "results": {"detectors": []}}'"#,
    );
    let adapters = tools(&slither.to_string_lossy(), "/nonexistent/forge");

    let outcome = adapters[0]
        .invoke(project.path(), &InvokeOptions::default())
        .await;
    assert_eq!(outcome.tool, ToolKind::StaticAnalyzer);
    assert_eq!(outcome.failure, None);

    let outcome = adapters[1]
        .invoke(project.path(), &InvokeOptions::default())
        .await;
    assert_eq!(outcome.tool, ToolKind::DynamicTester);
    assert_eq!(outcome.failure, Some(af_core::step::FailureKind::ToolMissing));
}
