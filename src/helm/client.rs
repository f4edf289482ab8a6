/// Helm client for chart fetch, template and repository commands
use std::path::{Component, Path, PathBuf};

use crate::config::ExecEnv;
use crate::error::Result;
use crate::utils::command::{run_checked, CommandSpec, Executor};
use crate::utils::fs::ensure_private_dir;

/// Directory under HOME holding vendored binaries
const LOCAL_BIN_DIR: &str = ".k3sup/.bin";

/// Path of a vendored binary: `<home>/.k3sup/.bin/<name>`
///
/// The file is not checked for existence; a missing binary shows up as a
/// launch error when it is run.
pub fn local_binary(home: &Path, name: &str) -> PathBuf {
    home.join(LOCAL_BIN_DIR).join(name)
}

/// Append `rel` below `root`, treating an absolute `rel` as relative
fn join_under(root: &Path, rel: &Path) -> PathBuf {
    let rel: PathBuf = rel
        .components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect();
    root.join(rel)
}

/// Runs the vendored `helm` binary
pub struct HelmClient<E> {
    executor: E,
    env: ExecEnv,
}

impl<E: Executor> HelmClient<E> {
    /// Create a new helm client
    pub fn new(executor: E, env: ExecEnv) -> Self {
        Self { executor, env }
    }

    /// Path of the helm binary for the configured home
    pub fn binary(&self) -> PathBuf {
        local_binary(self.env.home(), "helm")
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(self.binary()).env(&self.env)
    }

    /// Fetch and unpack `chart` into `path`, creating the directory if needed
    pub async fn fetch_chart(&self, path: &Path, chart: &str) -> Result<()> {
        ensure_private_dir(path).await?;

        let spec = self
            .command()
            .args(["fetch", chart, "--untar", "--untardir"])
            .arg(path.as_os_str());

        run_checked(&self.executor, &spec).await
    }

    /// Render `chart` found under `base_path` into `output_path`
    ///
    /// `values` is relative to the chart's own directory. helm runs with
    /// `base_path` as its working directory.
    pub async fn template_chart(
        &self,
        base_path: &Path,
        chart: &str,
        namespace: &str,
        output_path: &Path,
        values: &str,
    ) -> Result<()> {
        ensure_private_dir(output_path).await?;

        let chart_root = join_under(base_path, Path::new(chart));
        let spec = self
            .command()
            .args(["template", chart, "--output-dir"])
            .arg(output_path.as_os_str())
            .arg("--values")
            .arg(join_under(&chart_root, Path::new(values)))
            .args(["--namespace", namespace])
            .current_dir(base_path);

        run_checked(&self.executor, &spec).await
    }

    /// Add a chart repository
    pub async fn add_repo(&self, name: &str, url: &str) -> Result<()> {
        let spec = self.command().args(["repo", "add", name, url]);
        run_checked(&self.executor, &spec).await
    }

    /// Refresh all chart repositories
    pub async fn update_repos(&self) -> Result<()> {
        let spec = self.command().args(["repo", "update"]);
        run_checked(&self.executor, &spec).await
    }

    /// Initialise helm's client-side state only (helm 2)
    pub async fn init_client(&self) -> Result<()> {
        let spec = self.command().args(["init", "--client-only"]);
        run_checked(&self.executor, &spec).await
    }
}
