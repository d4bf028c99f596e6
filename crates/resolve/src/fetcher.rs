use async_trait::async_trait;
use modsmith_transfer::Transfer;
use std::path::{Path, PathBuf};

/// Puts a remote artifact at a local path.
///
/// Failures are not reported. The resolver notices them by the module still
/// being missing after the round.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, uri: &str, path: &Path) -> PathBuf;
}

#[async_trait]
impl ArtifactFetcher for Transfer {
    async fn fetch(&self, uri: &str, path: &Path) -> PathBuf {
        Transfer::fetch(self, uri, path).await
    }
}
