use super::*;
use crate::test_utils::fake_tool;
use tempfile::TempDir;

#[tokio::test]
async fn test_run_captures_output_and_exit_code() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(dir.path(), "tool", "echo out; echo err >&2; exit 3");

    let runner = ProcessRunner::new(2);
    let output = runner
        .run(
            &CommandSpec::new(tool.to_string_lossy()),
            Duration::from_secs(10),
        )
        .await;

    assert_eq!(output.exit, ExitKind::Exited(3));
    assert_eq!(output.exit_code(), Some(3));
    assert!(!output.success());
    assert_eq!(output.stdout.trim(), "out");
    assert_eq!(output.stderr.trim(), "err");
}

#[tokio::test]
async fn test_run_passes_args_and_working_dir() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(dir.path(), "tool", "pwd; echo \"$@\"");
    let work = dir.path().join("work");
    std::fs::create_dir(&work).unwrap();

    let output = ProcessRunner::new(1)
        .run(
            &CommandSpec::new(tool.to_string_lossy())
                .arg("--json")
                .args(["-", "--flag"])
                .current_dir(&work),
            Duration::from_secs(10),
        )
        .await;

    assert!(output.success());
    let mut lines = output.stdout.lines();
    let cwd = lines.next().unwrap();
    assert!(cwd.ends_with("work"), "cwd was {cwd}");
    assert_eq!(lines.next(), Some("--json - --flag"));
}

#[tokio::test]
async fn test_run_missing_binary() {
    let output = ProcessRunner::new(1)
        .run(
            &CommandSpec::new("/nonexistent/auditflow-no-such-tool"),
            Duration::from_secs(5),
        )
        .await;
    assert!(matches!(output.exit, ExitKind::Missing(_)));
    assert_eq!(output.exit_code(), None);
}

#[tokio::test]
async fn test_run_non_executable_is_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.txt");
    std::fs::write(&path, "not a program").unwrap();

    let output = ProcessRunner::new(1)
        .run(
            &CommandSpec::new(path.to_string_lossy()),
            Duration::from_secs(5),
        )
        .await;
    assert!(matches!(output.exit, ExitKind::Missing(_)));
}

#[tokio::test]
async fn test_run_times_out() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(dir.path(), "slow", "exec sleep 30");

    let started = Instant::now();
    let output = ProcessRunner::new(1)
        .run(
            &CommandSpec::new(tool.to_string_lossy()),
            Duration::from_millis(200),
        )
        .await;

    assert_eq!(output.exit, ExitKind::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_command_display() {
    let spec = CommandSpec::new("slither").arg(".").args(["--json", "-"]);
    assert_eq!(spec.display(), "slither . --json -");
    assert_eq!(spec.program(), "slither");
}
