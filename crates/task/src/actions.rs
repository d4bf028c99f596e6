//! Built-in file system actions

use crate::execution::Execution;
use crate::task::Action;
use async_trait::async_trait;
use modsmith_core::{Error, Result};
use std::path::PathBuf;
use tracing::Level;

/// Create directories, including missing parents
pub struct CreateDirectories {
    paths: Vec<PathBuf>,
}

impl CreateDirectories {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Action for CreateDirectories {
    async fn execute(&self, execution: &mut Execution) -> Result<()> {
        for path in &self.paths {
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| Error::file_system(path, "create directory", e))?;
            execution.print(Level::DEBUG, format!("created {}", path.display()));
        }
        Ok(())
    }
}

/// Delete directory trees; absent directories are skipped
pub struct DeleteDirectories {
    paths: Vec<PathBuf>,
}

impl DeleteDirectories {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Action for DeleteDirectories {
    async fn execute(&self, execution: &mut Execution) -> Result<()> {
        for path in &self.paths {
            match tokio::fs::remove_dir_all(path).await {
                Ok(()) => execution.print(Level::DEBUG, format!("deleted {}", path.display())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::file_system(path, "delete directory", e)),
            }
        }
        Ok(())
    }
}
