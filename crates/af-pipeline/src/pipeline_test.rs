use super::*;
use tempfile::TempDir;

fn pipeline() -> Pipeline {
    Pipeline::new(Config::default())
        .unwrap()
        .with_token_counter(Arc::new(crate::tokens::ApproximateCounter))
}

#[test]
fn test_new_rejects_invalid_config() {
    let config = Config {
        max_concurrent_tools: 0,
        ..Default::default()
    };
    assert!(matches!(Pipeline::new(config), Err(PipelineError::Config(_))));
}

#[test]
fn test_plan_rejects_missing_root() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = pipeline().plan(AuditRequest::new(&missing)).unwrap_err();
    match err {
        PipelineError::ProjectNotFound { path } => assert_eq!(path, missing),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_plan_rejects_bad_glob() {
    let dir = TempDir::new().unwrap();
    let request = AuditRequest::new(dir.path()).with_exclude(vec!["src/[".to_string()]);
    let err = pipeline().plan(request).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidExcludePattern { ref pattern, .. } if pattern == "src/["));
    assert!(err.to_string().starts_with("[P002]"));
}

#[test]
fn test_plan_rejects_bad_address() {
    let dir = TempDir::new().unwrap();
    let request = AuditRequest::new(dir.path()).with_fetch(af_cache::Network::Mainnet, "0x12");
    assert!(matches!(
        pipeline().plan(request),
        Err(PipelineError::InvalidFetchRequest { .. })
    ));
}

#[test]
fn test_plan_applies_overrides_and_cache_exclusion() {
    let dir = TempDir::new().unwrap();
    let request = AuditRequest::new(dir.path())
        .with_exclude(vec!["mocks/**".to_string()])
        .with_fuzz_runs(32);
    let plan = pipeline().plan(request).unwrap();

    assert_eq!(plan.options.fuzz_runs, 32);
    assert!(plan.exclusions.is_excluded("mocks/Mock.sol"));
    assert!(plan.exclusions.is_excluded(".audit_cache/mainnet_0xabc/sources/A.sol"));
    assert!(!plan.exclusions.is_excluded("lib/forge-std/Test.sol"));
    assert_eq!(plan.project_root, dir.path().canonicalize().unwrap());
}

#[test]
fn test_plan_defaults_from_config() {
    let dir = TempDir::new().unwrap();
    let plan = pipeline().plan(AuditRequest::new(dir.path())).unwrap();
    assert_eq!(plan.options.fuzz_runs, 256);
    assert!(plan.exclusions.is_excluded("lib/forge-std/Test.sol"));
    assert!(plan.fetch.is_none());
}
