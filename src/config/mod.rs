/// Configuration for chartkit: injected environment and optional settings file
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Environment handed to every spawned helm/kubectl process
///
/// `home` locates the vendored binaries; `vars` is the complete child
/// environment. Nothing here reads the process environment after construction.
#[derive(Debug, Clone, Default)]
pub struct ExecEnv {
    home: PathBuf,
    vars: Vec<(OsString, OsString)>,
}

impl ExecEnv {
    /// Build an environment from explicit values
    ///
    /// `vars` is the whole child environment. When it has no PATH, programs
    /// such as kubectl are still resolved through the caller's PATH.
    pub fn new<I, K, V>(home: impl Into<PathBuf>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        Self {
            home: home.into(),
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Snapshot HOME and the full environment of the current process
    pub fn from_process() -> Self {
        Self {
            home: std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default(),
            vars: std::env::vars_os().collect(),
        }
    }

    /// Home directory used to resolve vendored binaries
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Replace the home directory
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    /// Set or override a single variable
    pub fn with_var(mut self, key: impl Into<OsString>, val: impl Into<OsString>) -> Self {
        let key = key.into();
        let val = val.into();
        match self.vars.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = val,
            None => self.vars.push((key, val)),
        }
        self
    }

    /// Look up a variable
    pub fn var(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        let key = key.as_ref();
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    /// All variables, in insertion order
    pub fn vars(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }
}

/// Optional settings loaded from a YAML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Root under which `.k3sup/.bin` is looked up (defaults to HOME)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<PathBuf>,

    /// Kubeconfig exported to helm and kubectl as KUBECONFIG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<PathBuf>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if matches!(&self.home, Some(home) if home.as_os_str().is_empty()) {
            anyhow::bail!("home cannot be empty when set");
        }

        if matches!(&self.kubeconfig, Some(path) if path.as_os_str().is_empty()) {
            anyhow::bail!("kubeconfig cannot be empty when set");
        }

        Ok(())
    }

    /// Apply these settings on top of a base environment
    pub fn exec_env(&self, base: ExecEnv) -> ExecEnv {
        let mut env = base;
        if let Some(home) = &self.home {
            env = env.with_home(home);
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            env = env.with_var("KUBECONFIG", kubeconfig);
        }
        env
    }

    /// Generate an example settings file
    pub fn example() -> Self {
        Self {
            home: None,
            kubeconfig: Some(PathBuf::from("./kubeconfig")),
        }
    }
}
