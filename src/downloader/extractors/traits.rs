// InfoExtractor trait and common types

use async_trait::async_trait;
use serde_json::Value;

use crate::downloader::errors::DownloadError;
use crate::downloader::format_selector::MediaCatalog;
use crate::downloader::models::VideoId;

/// Configuration for info extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Path to cookies.txt file
    pub cookies_path: Option<String>,
    /// Browser to read cookies from (chrome, firefox, ...)
    pub cookies_from_browser: Option<String>,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Let yt-dlp print HTTP traffic
    pub print_traffic: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            cookies_path: None,
            cookies_from_browser: None,
            timeout_seconds: 60,
            print_traffic: false,
        }
    }
}

impl ExtractorConfig {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_cookies_path(mut self, path: Option<String>) -> Self {
        self.cookies_path = path;
        self
    }

    pub fn with_cookies_from_browser(mut self, browser: Option<String>) -> Self {
        self.cookies_from_browser = browser;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_print_traffic(mut self, enabled: bool) -> Self {
        self.print_traffic = enabled;
        self
    }
}

/// Catalog as returned by the extractor
///
/// `raw` is kept verbatim for the JSON export.
#[derive(Debug, Clone)]
pub struct ExtractedInfo {
    pub raw: Value,
    pub catalog: MediaCatalog,
}

impl ExtractedInfo {
    pub fn from_value(raw: Value) -> Result<Self, DownloadError> {
        let catalog = MediaCatalog::from_value(raw.clone())?;
        Ok(Self { raw, catalog })
    }
}

/// Trait for info extractors
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Check if this extractor is available
    fn is_available(&self) -> bool;

    /// Fetch the full catalog of one video
    async fn extract(
        &self,
        video: &VideoId,
        config: &ExtractorConfig,
    ) -> Result<ExtractedInfo, DownloadError>;
}
