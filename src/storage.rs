use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, trace};

use crate::url_parser::{map_url_to_path, NormalizedUrl};

/// Writes rendered pages into a directory tree mirroring the site's URLs
#[derive(Debug, Clone)]
pub struct PageWriter {
    root: PathBuf,
}

impl PageWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the output root if it doesn't exist
    pub async fn prepare(&self) -> Result<()> {
        trace!("Ensuring output directory exists: {}", self.root.display());
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create output directory: {}", self.root.display()))
    }

    /// Absolute location the page for `url` is stored at
    pub fn path_for(&self, url: &NormalizedUrl) -> PathBuf {
        self.root.join(map_url_to_path(url))
    }

    /// Writes `html` for `url`, replacing any previous copy.
    ///
    /// Parent directories are created as needed. Returns the written path.
    pub async fn write_page(&self, url: &NormalizedUrl, html: &str) -> Result<PathBuf> {
        let file_path = self.path_for(url);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        debug!("Saving {} bytes to {}", html.len(), file_path.display());
        fs::write(&file_path, html.as_bytes())
            .await
            .with_context(|| format!("Failed to write page to {}", file_path.display()))?;

        info!("Saved {} -> {}", url, file_path.display());
        Ok(file_path)
    }
}
