/// Helm chart and repository operations against the vendored helm binary
pub mod client;

pub use client::{local_binary, HelmClient};
