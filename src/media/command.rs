//! External tool invocation with testable command execution.
//!
//! The `CommandExecutor` trait enables full testability without ffmpeg installed.

use crate::error::{Result, SegscribeError};
use std::process::Command;
use std::sync::Mutex;

/// Trait for executing system commands.
///
/// Object-safe, Send + Sync for use in concurrent contexts.
/// Enables testability by allowing mock implementations.
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with arguments.
    ///
    /// Returns the stdout of the command on success.
    /// Returns an error if the command fails or is not found; the error
    /// message carries the tool's stderr for diagnosis.
    fn execute(&self, command: &str, args: &[&str]) -> Result<String>;
}

/// Implement CommandExecutor for Arc<E> to allow sharing across stages.
impl<E: CommandExecutor + ?Sized> CommandExecutor for std::sync::Arc<E> {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        (**self).execute(command, args)
    }
}

/// Production command executor using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(command).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SegscribeError::ToolNotFound {
                    tool: command.to_string(),
                }
            } else {
                SegscribeError::Transcode {
                    message: format!("Failed to execute {}: {}", command, e),
                }
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SegscribeError::Transcode {
                message: format!(
                    "{} failed with status {:?}: {}",
                    command,
                    output.status,
                    stderr.trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Scripted executor for tests: delegates to a closure and records every call.
pub struct ScriptedCommandExecutor {
    #[allow(clippy::type_complexity)]
    handler: Box<dyn Fn(&str, &[&str]) -> Result<String> + Send + Sync>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedCommandExecutor {
    /// Create a scripted executor backed by `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &[&str]) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Executor that succeeds with empty output for every invocation.
    pub fn succeeding() -> Self {
        Self::new(|_, _| Ok(String::new()))
    }

    /// Every invocation recorded so far, command first, then its arguments.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().expect("call log poisoned").clone()
    }
}

impl CommandExecutor for ScriptedCommandExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        let mut recorded = vec![command.to_string()];
        recorded.extend(args.iter().map(|a| a.to_string()));
        self.calls.lock().expect("call log poisoned").push(recorded);
        (self.handler)(command, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_executor_missing_tool() {
        let executor = SystemCommandExecutor::new();
        let result = executor.execute("definitely_not_a_real_tool_xyz", &[]);

        match result {
            Err(SegscribeError::ToolNotFound { tool }) => {
                assert_eq!(tool, "definitely_not_a_real_tool_xyz");
            }
            other => panic!("Expected ToolNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_system_executor_captures_stdout() {
        let executor = SystemCommandExecutor::new();
        let output = executor.execute("echo", &["hello"]).unwrap();
        assert_eq!(output.trim(), "hello");
    }

    #[test]
    fn test_system_executor_nonzero_exit_carries_stderr() {
        let executor = SystemCommandExecutor::new();
        let result = executor.execute("ls", &["/nonexistent_path_xyz_99999"]);

        match result {
            Err(SegscribeError::Transcode { message }) => {
                assert!(message.contains("ls"), "message: {message}");
            }
            other => panic!("Expected Transcode, got {:?}", other),
        }
    }

    #[test]
    fn test_scripted_executor_records_calls() {
        let executor = ScriptedCommandExecutor::succeeding();
        executor.execute("ffmpeg", &["-i", "in.mp4"]).unwrap();
        executor.execute("ffmpeg", &["-version"]).unwrap();

        let calls = executor.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], vec!["ffmpeg", "-i", "in.mp4"]);
        assert_eq!(calls[1], vec!["ffmpeg", "-version"]);
    }

    #[test]
    fn test_scripted_executor_propagates_failure() {
        let executor = ScriptedCommandExecutor::new(|_, _| {
            Err(SegscribeError::Transcode {
                message: "scripted failure".to_string(),
            })
        });

        let result = executor.execute("ffmpeg", &[]);
        assert!(matches!(result, Err(SegscribeError::Transcode { .. })));
    }
}
