/// Command execution primitive shared by the helm and kubectl helpers
use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::config::ExecEnv;
use crate::error::{ExecError, Result};

/// A fully described external command, built fresh for each call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(OsString, OsString)>,
}

impl CommandSpec {
    /// Create a command for the given program
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Add a single argument
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command from this directory instead of the caller's
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Use the variables of `env` as the complete child environment
    pub fn env(mut self, env: &ExecEnv) -> Self {
        self.env = env
            .vars()
            .map(|(k, v)| (k.to_os_string(), v.to_os_string()))
            .collect();
        self
    }

    /// Render as `program arg1 arg2 ...`, lossily for non UTF-8 arguments
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Value of a variable in the child environment
    pub fn env_var(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        let key = key.as_ref();
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    /// Working directory, if one was set
    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }
}

/// Result from command execution with captured output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Create from a finished process
    fn from_output(output: std::process::Output) -> Self {
        Self {
            // Signal-terminated processes have no code
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Return Ok if the exit code is zero, otherwise `ExecError::Command`
    pub fn check(&self) -> Result<()> {
        if self.success() {
            Ok(())
        } else {
            Err(ExecError::Command(self.exit_code))
        }
    }

    pub fn stdout_string(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Runs a command to completion and captures its output
///
/// Implementations must return `ExecError::Launch` when the process cannot be
/// started and a `CommandOutput` otherwise, whatever the exit code.
pub trait Executor: Send + Sync {
    fn execute(&self, spec: &CommandSpec) -> impl Future<Output = Result<CommandOutput>> + Send;
}

impl<E: Executor> Executor for &E {
    fn execute(&self, spec: &CommandSpec) -> impl Future<Output = Result<CommandOutput>> + Send {
        (**self).execute(spec)
    }
}

/// Executor backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!(
            "Running {} (cwd: {})",
            spec.command_line(),
            spec.working_dir()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| ".".to_string())
        );

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .env_clear()
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Without PATH in the child env, programs resolve through the caller's PATH
        if spec.env_var("PATH").is_none() {
            if let Some(path) = std::env::var_os("PATH") {
                command.env("PATH", path);
            }
        }
        if let Some(dir) = &spec.cwd {
            command.current_dir(dir);
        }

        let output = command.output().await.map_err(ExecError::Launch)?;
        let output = CommandOutput::from_output(output);

        debug!("{} exited with code {}", spec.program.display(), output.exit_code);

        Ok(output)
    }
}

/// Execute a command and fail on a non-zero exit code
pub async fn run_checked<E: Executor>(executor: &E, spec: &CommandSpec) -> Result<()> {
    executor.execute(spec).await?.check()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    /// Scripted reply of a `RecordingExecutor`
    #[derive(Debug, Clone)]
    pub enum Reply {
        Exit { code: i32, stdout: String },
        LaunchFailure,
    }

    /// Test double that records every command instead of running it
    pub struct RecordingExecutor {
        reply: Reply,
        calls: Mutex<Vec<CommandSpec>>,
    }

    impl RecordingExecutor {
        pub fn exiting(code: i32) -> Self {
            Self::replying(Reply::Exit {
                code,
                stdout: String::new(),
            })
        }

        pub fn printing(stdout: &str) -> Self {
            Self::replying(Reply::Exit {
                code: 0,
                stdout: stdout.to_string(),
            })
        }

        pub fn failing_to_launch() -> Self {
            Self::replying(Reply::LaunchFailure)
        }

        pub fn replying(reply: Reply) -> Self {
            Self {
                reply,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        /// The single recorded command
        pub fn only_call(&self) -> CommandSpec {
            let calls = self.calls();
            assert_eq!(calls.len(), 1, "expected exactly one command, got {:?}", calls);
            calls.into_iter().next().unwrap()
        }
    }

    impl Executor for RecordingExecutor {
        async fn execute(&self, spec: &CommandSpec) -> Result<CommandOutput> {
            self.calls.lock().unwrap().push(spec.clone());
            match &self.reply {
                Reply::Exit { code, stdout } => Ok(CommandOutput {
                    exit_code: *code,
                    stdout: stdout.as_bytes().to_vec(),
                    stderr: Vec::new(),
                }),
                Reply::LaunchFailure => Err(ExecError::Launch(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{}: not found", spec.program.display()),
                ))),
            }
        }
    }
}
