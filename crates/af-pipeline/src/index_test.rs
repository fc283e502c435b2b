use super::*;
use af_core::SourceFile;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

fn project(root: &Path) -> ContractProject {
    ContractProject::from_files(
        root,
        vec![
            SourceFile::new("src/Vault.sol", "contract Vault {\n}\n"),
            SourceFile::new("src/A.sol", "contract A {}\n"),
        ],
    )
}

fn request(root: &Path) -> IndexRequest {
    IndexRequest {
        source_root: root.to_path_buf(),
        index_file: "detailed_index.md".to_string(),
    }
}

fn script(dir: &Path, body: &str) -> String {
    let path = dir.join("indexer");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_basic_render_lists_files_sorted() {
    let dir = TempDir::new().unwrap();
    let content = BasicIndexGenerator::render(&project(dir.path()));

    assert!(content.starts_with("# Smart Contract Audit Index"));
    assert!(content.contains("**Files**: 2 source files"));
    let a = content.find("### src/A.sol").unwrap();
    let vault = content.find("### src/Vault.sol").unwrap();
    assert!(a < vault);
    assert!(content.contains("- **Size**: 19 bytes"));
}

#[tokio::test]
async fn test_empty_project_fails() {
    let dir = TempDir::new().unwrap();
    let empty = ContractProject::from_files(dir.path(), Vec::new());
    let generator = DefaultIndexGenerator::from_config(&IndexConfig::default(), &ProcessRunner::new(1));

    let err = generator
        .generate(&empty, &request(dir.path()))
        .await
        .unwrap_err();
    assert!(matches!(err, IndexError::NoSources { .. }));
}

#[tokio::test]
async fn test_default_without_command_is_basic() {
    let dir = TempDir::new().unwrap();
    let generator = DefaultIndexGenerator::from_config(&IndexConfig::default(), &ProcessRunner::new(1));

    let index = generator
        .generate(&project(dir.path()), &request(dir.path()))
        .await
        .unwrap();
    assert_eq!(index.method, IndexMethod::Basic);
    assert_eq!(index.fallback_reason, None);
}

#[tokio::test]
async fn test_command_writes_index() {
    let bin = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let indexer = script(bin.path(), "echo '# Detailed index' > \"$1/detailed_index.md\"");
    let config = IndexConfig {
        command: Some(vec![indexer]),
        ..Default::default()
    };

    let index = DefaultIndexGenerator::from_config(&config, &ProcessRunner::new(1))
        .generate(&project(root.path()), &request(root.path()))
        .await
        .unwrap();
    assert_eq!(index.method, IndexMethod::Command);
    assert_eq!(index.content.trim(), "# Detailed index");
}

#[tokio::test]
async fn test_failing_command_falls_back_to_basic() {
    let bin = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let indexer = script(bin.path(), "echo 'model unavailable' >&2; exit 1");
    let config = IndexConfig {
        command: Some(vec![indexer]),
        ..Default::default()
    };

    let index = DefaultIndexGenerator::from_config(&config, &ProcessRunner::new(1))
        .generate(&project(root.path()), &request(root.path()))
        .await
        .unwrap();
    assert_eq!(index.method, IndexMethod::Basic);
    let reason = index.fallback_reason.unwrap();
    assert!(reason.contains("[I002]"));
    assert!(reason.contains("model unavailable"));
}

#[tokio::test]
async fn test_command_without_output_file_falls_back() {
    let bin = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let indexer = script(bin.path(), "exit 0");
    let config = IndexConfig {
        command: Some(vec![indexer]),
        ..Default::default()
    };

    let index = DefaultIndexGenerator::from_config(&config, &ProcessRunner::new(1))
        .generate(&project(root.path()), &request(root.path()))
        .await
        .unwrap();
    assert_eq!(index.method, IndexMethod::Basic);
    assert!(index.fallback_reason.unwrap().contains("[I003]"));
}
