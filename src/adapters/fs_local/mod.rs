// Local filesystem adapter - File operations used after an export

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::ports::*;

/// Filesystem adapter backed by `tokio::fs`
#[derive(Debug, Clone, Default)]
pub struct LocalFsAdapter;

impl LocalFsAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FsPort for LocalFsAdapter {
    async fn file_exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        debug!("Removing {}", path.display());
        tokio::fs::remove_file(path).await
    }
}
