/// Filesystem helpers for chart destinations
use std::path::Path;
use tokio::fs::DirBuilder;

use crate::error::{ExecError, Result};

/// Create `path` and any missing parents, owner-only on unix
///
/// An already existing directory is not an error.
pub async fn ensure_private_dir(path: &Path) -> Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);

    builder
        .create(path)
        .await
        .map_err(|source| ExecError::Directory {
            path: path.to_path_buf(),
            source,
        })
}
