//! Timeout-bounded foreign process execution
//!
//! All external tools run through one [`ProcessRunner`], whose semaphore is the
//! worker pool bounding how many foreign processes run at once.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Attempts made when the kernel reports the executable as busy
const SPAWN_ATTEMPTS: usize = 3;
const ETXTBSY: i32 = 26;

/// A command line to run
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Shell-like rendering for logs and reports
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().to_string()));
        parts.join(" ")
    }
}

/// How a process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitKind {
    /// Exited with a status code
    Exited(i32),
    /// Killed by a signal it did not arrange itself
    Signaled,
    /// Killed after exceeding its budget
    TimedOut,
    /// The program could not be found or executed
    Missing(String),
    /// Spawning or waiting failed for another reason
    SpawnFailed(String),
}

/// Captured result of one process run
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub exit: ExitKind,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ProcessOutput {
    pub fn exit_code(&self) -> Option<i32> {
        match self.exit {
            ExitKind::Exited(code) => Some(code),
            _ => None,
        }
    }

    pub fn success(&self) -> bool {
        self.exit == ExitKind::Exited(0)
    }

    fn without_output(exit: ExitKind, duration: Duration) -> Self {
        Self {
            exit,
            stdout: String::new(),
            stderr: String::new(),
            duration,
        }
    }
}

/// Runs commands under a shared concurrency limit
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    permits: Arc<Semaphore>,
}

impl ProcessRunner {
    /// Create a runner allowing `max_concurrent` simultaneous processes
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Run `spec` to completion or until `budget` elapses.
    ///
    /// The child is spawned with `kill_on_drop`, so it is killed both on
    /// timeout and when the returned future is dropped by a caller-level
    /// timeout.
    pub async fn run(&self, spec: &CommandSpec, budget: Duration) -> ProcessOutput {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return ProcessOutput::without_output(
                    ExitKind::SpawnFailed("worker pool closed".to_string()),
                    Duration::ZERO,
                )
            }
        };

        let started = Instant::now();
        log::debug!("Running `{}` (budget {}s)", spec.display(), budget.as_secs());

        let child = match self.spawn(spec).await {
            Ok(child) => child,
            Err(e) => {
                let exit = match e.kind() {
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                        ExitKind::Missing(format!("{}: {}", spec.program, e))
                    }
                    _ => ExitKind::SpawnFailed(format!("{}: {}", spec.program, e)),
                };
                return ProcessOutput::without_output(exit, started.elapsed());
            }
        };

        match tokio::time::timeout(budget, child.wait_with_output()).await {
            Ok(Ok(output)) => ProcessOutput {
                exit: output
                    .status
                    .code()
                    .map(ExitKind::Exited)
                    .unwrap_or(ExitKind::Signaled),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                duration: started.elapsed(),
            },
            Ok(Err(e)) => ProcessOutput::without_output(
                ExitKind::SpawnFailed(format!("waiting for {}: {}", spec.program, e)),
                started.elapsed(),
            ),
            Err(_) => {
                log::warn!(
                    "`{}` exceeded its {}s budget and was terminated",
                    spec.display(),
                    budget.as_secs()
                );
                ProcessOutput::without_output(ExitKind::TimedOut, started.elapsed())
            }
        }
    }

    async fn spawn(&self, spec: &CommandSpec) -> std::io::Result<tokio::process::Child> {
        let mut attempt = 0;
        loop {
            let mut command = tokio::process::Command::new(&spec.program);
            command
                .args(&spec.args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            if let Some(dir) = &spec.cwd {
                command.current_dir(dir);
            }

            match command.spawn() {
                Err(e) if e.raw_os_error() == Some(ETXTBSY) && attempt + 1 < SPAWN_ATTEMPTS => {
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
#[path = "process_test.rs"]
mod tests;
