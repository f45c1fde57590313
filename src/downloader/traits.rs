// Downloader backend trait definition

use async_trait::async_trait;
use tracing::info;

use super::errors::DownloadError;
use super::models::{DownloadJob, DownloadProgress};

/// Trait for downloader backend implementations
#[async_trait]
pub trait DownloaderBackend: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool;

    /// Download the selected formats with progress updates
    async fn download(&self, job: &DownloadJob, progress: &ProgressEmitter) -> Result<(), DownloadError>;
}

type ProgressCallback = Box<dyn Fn(&DownloadProgress) + Send + Sync>;

/// Progress emitter helper
///
/// Logs every update; an optional callback receives them as well.
#[derive(Default)]
pub struct ProgressEmitter {
    callback: Option<ProgressCallback>,
}

impl ProgressEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: impl Fn(&DownloadProgress) + Send + Sync + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    pub fn emit(&self, progress: DownloadProgress) {
        info!("{:5.1}% {}", progress.percent, progress.status);
        if let Some(callback) = &self.callback {
            callback(&progress);
        }
    }
}
