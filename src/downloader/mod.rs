// Downloader module - extraction, format selection and download

pub mod backends;
pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod traits;
pub mod utils;

pub use errors::DownloadError;
pub use models::{DownloadJob, DownloadOptions, DownloadProgress, VideoId};
pub use orchestrator::{DownloadOutcome, Downloader};
pub use traits::{DownloaderBackend, ProgressEmitter};
