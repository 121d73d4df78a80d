/// Command executor
///
/// Spawns a task's command with the output path exported in its
/// environment, waits for it (optionally with a timeout) and reports the
/// exit code.
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::logging::{operations, services};

/// Output path of the current task
pub const ENV_OUTPUT: &str = "VERSIONIZE_OUTPUT";
/// Version the output is produced for
pub const ENV_VERSION: &str = "VERSIONIZE_VERSION";
/// Output tag
pub const ENV_TAG: &str = "VERSIONIZE_TAG";

/// Result of command execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub duration: Duration,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Everything a command needs besides its argv
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

pub struct CommandExecutor {
    verbose: bool,
}

impl CommandExecutor {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Execute `command` (program followed by its arguments)
    ///
    /// The child's stdout is redirected to our stderr so that stdout stays
    /// reserved for versionize's own results.
    pub fn execute(&self, command: &[String], ctx: &ExecutionContext) -> Result<ExecutionResult> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("Empty command"))?;

        let start = Instant::now();

        // Resolve program from PATH
        let program_path = which::which(program).unwrap_or_else(|e| {
            if self.verbose {
                eprintln!(
                    "[versionize] Warning: Could not find '{}' in PATH: {}. Trying as-is.",
                    program, e
                );
            }
            PathBuf::from(program)
        });

        let mut cmd = Command::new(&program_path);
        cmd.args(args);
        cmd.envs(ctx.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        if let Some(cwd) = &ctx.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::from(std::io::stderr()));
        cmd.stderr(Stdio::inherit());

        if self.verbose {
            eprintln!("[versionize] Command: {:?}", cmd);
        }

        debug!(
            service = services::EXECUTOR,
            operation = operations::EXECUTE,
            program = %program_path.display(),
            "spawning command"
        );

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn command: {}", program))?;

        let status = match ctx.timeout {
            Some(timeout) => match wait_with_timeout(&mut child, timeout)? {
                Some(status) => status,
                None => anyhow::bail!(
                    "Command timed out after {}s: {}",
                    timeout.as_secs(),
                    command.join(" ")
                ),
            },
            None => child.wait().context("Failed to wait for child process")?,
        };

        let duration = start.elapsed();
        let exit_code = status.code().unwrap_or(-1);

        if self.verbose {
            eprintln!(
                "[versionize] Completed in {:.2}s with exit code {}",
                duration.as_secs_f64(),
                exit_code
            );
        }

        Ok(ExecutionResult {
            exit_code,
            duration,
        })
    }
}

/// Wait for the child, killing it once `timeout` has elapsed
///
/// Returns `None` when the child was killed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Option<ExitStatus>> {
    let start = Instant::now();

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            child.kill()?;
            child.wait()?; // Reap zombie
            return Ok(None);
        }
        thread::sleep(Duration::from_millis(50));
    }
}

/// Environment exported to a task command
pub fn task_env(output: &Path, version: &str, tag: &str) -> Vec<(String, String)> {
    vec![
        (ENV_OUTPUT.to_string(), output.display().to_string()),
        (ENV_VERSION.to_string(), version.to_string()),
        (ENV_TAG.to_string(), tag.to_string()),
    ]
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_execute_writes_to_exported_output() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out.txt");

        let ctx = ExecutionContext {
            env: task_env(&output, "1.0.1", "out.txt"),
            ..Default::default()
        };
        let result = CommandExecutor::new(false)
            .execute(
                &sh("printf '%s %s' \"$VERSIONIZE_TAG\" \"$VERSIONIZE_VERSION\" > \"$VERSIONIZE_OUTPUT\""),
                &ctx,
            )
            .unwrap();

        assert!(result.success());
        assert_eq!(fs::read_to_string(&output).unwrap(), "out.txt 1.0.1");
    }

    #[test]
    fn test_execute_reports_exit_code() {
        let result = CommandExecutor::new(false)
            .execute(&sh("exit 3"), &ExecutionContext::default())
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert!(!result.success());
    }

    #[test]
    fn test_execute_in_cwd() {
        let temp = TempDir::new().unwrap();
        let ctx = ExecutionContext {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };

        CommandExecutor::new(false)
            .execute(&sh("touch here.txt"), &ctx)
            .unwrap();

        assert!(temp.path().join("here.txt").exists());
    }

    #[test]
    fn test_execute_with_timeout() {
        let ctx = ExecutionContext {
            timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        };

        let result = CommandExecutor::new(false).execute(&sh("sleep 10"), &ctx);

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timed out"));
    }

    #[test]
    fn test_empty_command_is_an_error() {
        let result = CommandExecutor::new(false).execute(&[], &ExecutionContext::default());
        assert!(result.is_err());
    }
}
