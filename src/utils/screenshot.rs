use std::path::PathBuf;

use chrono::Local;
use tracing::info;

use crate::errors::Result;

/// Persists screenshot checkpoints under one directory. The automation only
/// names the step; this sink owns file naming and layout.
#[derive(Debug, Clone)]
pub struct ScreenshotSink {
    dir: PathBuf,
}

impl ScreenshotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes `bytes` as `screenshot_<step>_<timestamp>.png`, creating the
    /// directory on first use.
    pub async fn save(&self, bytes: &[u8], step: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("screenshot_{}_{}.png", step, timestamp));
        tokio::fs::write(&path, bytes).await?;
        info!("Screenshot saved to {}", path.display());
        Ok(path)
    }
}
