/// Process and filesystem helpers
pub mod command;
pub mod fs;

pub use command::{CommandOutput, CommandSpec, Executor, SystemExecutor};
