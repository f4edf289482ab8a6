/// Kubernetes cluster queries through kubectl
pub mod kubectl;

pub use kubectl::{ArchitectureProbe, Kubectl};
