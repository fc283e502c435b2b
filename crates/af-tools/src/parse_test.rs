use super::*;

const REPORT: &str = r#"{
  "success": true,
  "error": null,
  "results": {
    "detectors": [
      {
        "check": "reentrancy-eth",
        "impact": "High",
        "confidence": "Medium",
        "description": "Reentrancy in Vault.withdraw(uint256)\n",
        "first_markdown_element": "src/Vault.sol#L20-L31",
        "elements": []
      },
      {
        "check": "naming-convention",
        "impact": "Informational",
        "confidence": "High",
        "description": "Parameter _x is not in mixedCase",
        "elements": [
          {"source_mapping": {"filename_relative": "src/Token.sol", "lines": [7, 8]}}
        ]
      }
    ]
  }
}"#;

#[test]
fn test_parse_static_report_findings() {
    let findings = parse_static_report(REPORT).unwrap();
    assert_eq!(findings.len(), 2);

    assert_eq!(findings[0].severity, Severity::High);
    assert_eq!(findings[0].check, "reentrancy-eth");
    assert_eq!(findings[0].confidence.as_deref(), Some("Medium"));
    assert_eq!(findings[0].location.as_deref(), Some("src/Vault.sol#L20-L31"));
    assert_eq!(findings[0].description, "Reentrancy in Vault.withdraw(uint256)");

    assert_eq!(findings[1].severity, Severity::Informational);
    assert_eq!(findings[1].location.as_deref(), Some("src/Token.sol#L7"));
}

#[test]
fn test_parse_static_report_without_detectors() {
    let findings = parse_static_report(r#"{"success": true, "error": null, "results": {}}"#).unwrap();
    assert!(findings.is_empty());
}

#[test]
fn test_parse_static_report_reported_failure() {
    let err = parse_static_report(r#"{"success": false, "error": "compilation failed"}"#)
        .unwrap_err();
    match err {
        ToolError::AnalyzerReported(msg) => assert_eq!(msg, "compilation failed"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_parse_static_report_malformed() {
    assert!(matches!(
        parse_static_report("Traceback (most recent call last):"),
        Err(ToolError::MalformedOutput(_))
    ));
    assert!(matches!(
        parse_static_report("   \n"),
        Err(ToolError::MalformedOutput(_))
    ));
}

#[test]
fn test_parse_test_summary_total_line() {
    let output = "\
Ran 3 tests for test/Vault.t.sol:VaultTest
Suite result: FAILED. 2 passed; 1 failed; 0 skipped; finished in 1.20ms

Ran 2 test suites in 4.51ms (2.10ms CPU time): 5 tests passed, 1 failed, 2 skipped (8 total tests)
";
    let summary = parse_test_summary(output).unwrap();
    assert_eq!(
        summary,
        TestSummary {
            passed: 5,
            failed: 1,
            skipped: 2
        }
    );
}

#[test]
fn test_parse_test_summary_sums_suites() {
    let output = "\
Suite result: ok. 3 passed; 0 failed; 0 skipped; finished in 1.00ms
Suite result: FAILED. 1 passed; 2 failed; 1 skipped; finished in 2.00ms
";
    let summary = parse_test_summary(output).unwrap();
    assert_eq!(summary.passed, 4);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.skipped, 1);
}

#[test]
fn test_parse_test_summary_missing() {
    assert!(matches!(
        parse_test_summary("Error: compilation failed"),
        Err(ToolError::NoTestSummary)
    ));
}
