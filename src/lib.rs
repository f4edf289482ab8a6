//! chartkit - Helm and kubectl helpers for cluster bootstrapping
//!
//! Thin wrappers that run the vendored `helm` binary and `kubectl` from PATH,
//! translating a non-zero exit into an error.

pub mod config;
pub mod error;
pub mod helm;
pub mod k8s;
pub mod utils;

pub use config::{ExecEnv, Settings};
pub use error::{ExecError, Result};
pub use helm::{local_binary, HelmClient};
pub use k8s::{ArchitectureProbe, Kubectl};
pub use utils::{CommandOutput, CommandSpec, Executor, SystemExecutor};
