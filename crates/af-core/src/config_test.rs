use super::*;
use tempfile::tempdir;

#[test]
fn test_parse_empty_config_uses_defaults() {
    let config: Config = serde_yaml::from_str("{}").unwrap();
    assert_eq!(config.fuzz_runs, 256);
    assert_eq!(config.tools.static_analyzer.binary, "slither");
    assert_eq!(config.tools.static_analyzer.timeout_secs, 300);
    assert_eq!(config.tools.dynamic_tester.binary, "forge");
    assert_eq!(config.tools.dynamic_tester.fuzz_timeout_secs, 600);
    assert_eq!(config.report_file, "audit_report.json");
    assert!(config.exclude.iter().any(|p| p == "lib/**"));
    assert!(config.index.command.is_none());
    config.validate().unwrap();
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
exclude:
  - "lib/**"
  - "mocks/**"
cache_dir: /var/cache/audits
fuzz_runs: 1000
max_concurrent_tools: 4
pipeline_timeout_secs: 120
tools:
  static_analyzer:
    binary: /opt/slither
    timeout_secs: 60
    filter_paths: ["lib/"]
  dynamic_tester:
    binary: /opt/forge
    fuzz_timeout_secs: 90
index:
  command: ["python3", "indexer.py"]
chain:
  api_key: "KEY"
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    config.validate().unwrap();
    assert_eq!(config.exclude, vec!["lib/**", "mocks/**"]);
    assert_eq!(config.fuzz_runs, 1000);
    assert_eq!(config.max_concurrent_tools, 4);
    assert_eq!(config.tools.static_analyzer.binary, "/opt/slither");
    assert!(config.tools.static_analyzer.exclude_dependencies);
    assert_eq!(config.tools.dynamic_tester.fuzz_timeout_secs, 90);
    assert_eq!(config.tools.dynamic_tester.build_timeout_secs, 300);
    assert_eq!(
        config.index.command,
        Some(vec!["python3".to_string(), "indexer.py".to_string()])
    );
    assert_eq!(config.chain.api_key.as_deref(), Some("KEY"));
    assert_eq!(
        config.cache_dir_absolute(Path::new("/project")),
        PathBuf::from("/var/cache/audits")
    );
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("fuzz_run: 3");
    assert!(result.is_err());
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let mut config = Config::default();
    config.tools.dynamic_tester.test_timeout_secs = 0;
    let err = config.validate().unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    assert!(err.to_string().contains("test_timeout_secs"));
}

#[test]
fn test_validate_rejects_zero_workers() {
    let config = Config {
        max_concurrent_tools: 0,
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(CoreError::ConfigInvalid { .. })
    ));
}

#[test]
fn test_validate_rejects_malformed_glob() {
    let config = Config {
        exclude: vec!["lib/[".to_string()],
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(CoreError::InvalidExcludePattern { .. })
    ));
}

#[test]
fn test_load_from_dir_without_file_returns_defaults() {
    let dir = tempdir().unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.fuzz_runs, 256);
}

#[test]
fn test_load_from_dir_reads_yaml() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("auditflow.yaml"), "fuzz_runs: 32\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.fuzz_runs, 32);
}

#[test]
fn test_load_invalid_yaml_is_parse_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("auditflow.yml");
    std::fs::write(&path, "fuzz_runs: [not, a, number]\n").unwrap();
    assert!(matches!(
        Config::load(&path),
        Err(CoreError::ConfigParseError { .. })
    ));
}

#[test]
fn test_load_missing_file() {
    let result = Config::load(Path::new("/nonexistent/auditflow.yml"));
    assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
}

#[test]
fn test_audit_exclusions_add_cache_dir() {
    let config = Config::default();
    let set = config.audit_exclusions(None).unwrap();
    assert!(set.is_excluded(".audit_cache/mainnet_0xab/sources/Token.sol"));
    assert!(set.is_excluded("lib/forge-std/src/Test.sol"));

    let overrides = vec!["mocks/**".to_string()];
    let set = config.audit_exclusions(Some(overrides.as_slice())).unwrap();
    assert!(set.is_excluded("mocks/Mock.sol"));
    assert!(!set.is_excluded("lib/forge-std/src/Test.sol"));
    assert_eq!(set.patterns(), ["mocks/**", ".audit_cache/**"]);
}

#[test]
fn test_audit_exclusions_skip_absolute_cache_dir() {
    let config = Config {
        cache_dir: "/var/cache/auditflow".to_string(),
        ..Config::default()
    };
    let set = config.audit_exclusions(Some(&[][..])).unwrap();
    assert!(set.patterns().is_empty());
}
