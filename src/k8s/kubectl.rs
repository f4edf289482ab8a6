/// kubectl invocation, resolved through PATH
use std::ffi::OsString;
use tracing::debug;

use crate::config::ExecEnv;
use crate::error::Result;
use crate::utils::command::{run_checked, CommandOutput, CommandSpec, Executor};

const KUBECTL: &str = "kubectl";

/// jsonpath selecting the CPU architecture of the first node
const FIRST_NODE_ARCH_JSONPATH: &str =
    "jsonpath={range $.items[0]}{.status.nodeInfo.architecture}";

/// Outcome of the best-effort node architecture query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchitectureProbe {
    /// Trimmed stdout of the query; empty when nothing could be read
    pub arch: String,
    /// kubectl started and exited zero
    pub query_succeeded: bool,
}

/// Kubernetes client for kubectl operations
pub struct Kubectl<E> {
    executor: E,
    env: ExecEnv,
}

impl<E: Executor> Kubectl<E> {
    /// Create a new kubectl client
    pub fn new(executor: E, env: ExecEnv) -> Self {
        Self { executor, env }
    }

    fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        CommandSpec::new(KUBECTL).args(args).env(&self.env)
    }

    /// Run kubectl and fail on launch errors or a non-zero exit code
    pub async fn run<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        run_checked(&self.executor, &self.command(args)).await
    }

    /// Run kubectl and hand back the raw output without checking the exit code
    pub async fn task<I, S>(&self, args: I) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.executor.execute(&self.command(args)).await
    }

    /// Architecture of the first node, e.g. `amd64` or `arm64`
    ///
    /// Returns an empty string when the query fails, there are no nodes, or the
    /// field is absent. Use [`Kubectl::architecture_probe`] to tell these apart
    /// from a successful query.
    pub async fn architecture(&self) -> String {
        self.architecture_probe().await.arch
    }

    /// Architecture query with a success flag
    pub async fn architecture_probe(&self) -> ArchitectureProbe {
        let args = ["get", "nodes", "--output", FIRST_NODE_ARCH_JSONPATH];
        match self.task(args).await {
            Ok(output) => ArchitectureProbe {
                arch: output.stdout_string().trim().to_string(),
                query_succeeded: output.success(),
            },
            Err(e) => {
                debug!("Node architecture query failed: {}", e);
                ArchitectureProbe::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use crate::utils::command::testing::{RecordingExecutor, Reply};
    use std::path::PathBuf;
    use tokio_test::{assert_err, assert_ok};

    fn env() -> ExecEnv {
        ExecEnv::new("/home/dev", [("PATH", "/usr/local/bin:/usr/bin")])
    }

    #[tokio::test]
    async fn test_kubectl_resolved_through_path() {
        let executor = RecordingExecutor::exiting(0);
        let kubectl = Kubectl::new(&executor, env());

        assert_ok!(kubectl.run(["apply", "-f", "manifest.yaml"]).await);

        let call = executor.only_call();
        assert_eq!(call.program, PathBuf::from("kubectl"));
        assert_eq!(call.command_line(), "kubectl apply -f manifest.yaml");
        assert_eq!(call.working_dir(), None);
        assert_eq!(call.env.len(), 1);
    }

    #[tokio::test]
    async fn test_run_non_zero_exit() {
        let executor = RecordingExecutor::exiting(1);
        let kubectl = Kubectl::new(&executor, env());

        let err = assert_err!(kubectl.run(["get", "pods"]).await);
        assert_eq!(err.to_string(), "exit code 1");
    }

    #[tokio::test]
    async fn test_run_launch_failure() {
        let executor = RecordingExecutor::failing_to_launch();
        let kubectl = Kubectl::new(&executor, env());

        let err = assert_err!(kubectl.run(["get", "pods"]).await);
        assert!(matches!(err, ExecError::Launch(_)));
    }

    #[tokio::test]
    async fn test_task_does_not_check_exit_code() {
        let executor = RecordingExecutor::replying(Reply::Exit {
            code: 1,
            stdout: "partial".to_string(),
        });
        let kubectl = Kubectl::new(&executor, env());

        let output = assert_ok!(kubectl.task(["get", "nodes"]).await);
        assert_eq!(output.exit_code, 1);
        assert_eq!(output.stdout_string(), "partial");
    }

    #[tokio::test]
    async fn test_architecture_query_command() {
        let executor = RecordingExecutor::printing("  arm64\n");
        let kubectl = Kubectl::new(&executor, env());

        assert_eq!(kubectl.architecture().await, "arm64");

        let call = executor.only_call();
        assert_eq!(
            call.args,
            vec![
                "get",
                "nodes",
                "--output",
                "jsonpath={range $.items[0]}{.status.nodeInfo.architecture}",
            ]
        );
    }

    #[tokio::test]
    async fn test_architecture_empty_on_launch_failure() {
        let executor = RecordingExecutor::failing_to_launch();
        let kubectl = Kubectl::new(&executor, env());

        assert_eq!(kubectl.architecture().await, "");
        assert_eq!(
            kubectl.architecture_probe().await,
            ArchitectureProbe {
                arch: String::new(),
                query_succeeded: false,
            }
        );
    }

    #[tokio::test]
    async fn test_architecture_ignores_exit_code() {
        let executor = RecordingExecutor::replying(Reply::Exit {
            code: 1,
            stdout: "amd64 ".to_string(),
        });
        let kubectl = Kubectl::new(&executor, env());

        let probe = kubectl.architecture_probe().await;
        assert_eq!(probe.arch, "amd64");
        assert!(!probe.query_succeeded);
    }

    #[tokio::test]
    async fn test_architecture_no_nodes() {
        let executor = RecordingExecutor::printing("");
        let kubectl = Kubectl::new(&executor, env());

        let probe = kubectl.architecture_probe().await;
        assert_eq!(probe.arch, "");
        assert!(probe.query_succeeded);
    }
}
