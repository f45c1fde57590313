// Orchestrator - metadata, JSON export, selection, download

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

use super::errors::DownloadError;
use super::extractors::{ExtractorConfig, InfoExtractor};
use super::format_selector::{self, FormatRequest, TracingSink};
use super::models::{DownloadJob, DownloadOptions};
use super::traits::{DownloaderBackend, ProgressEmitter};
use super::utils::{export_json, format_timestamp, sanitize_filename_utf16};

/// What a run did
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub video_id: String,
    pub title: String,
    pub language: String,
    /// yt-dlp format expression
    pub format: String,
    pub exported_json: PathBuf,
    pub downloaded: bool,
}

pub struct Downloader {
    extractor: Box<dyn InfoExtractor>,
    backend: Box<dyn DownloaderBackend>,
    config: ExtractorConfig,
    progress: ProgressEmitter,
}

impl Downloader {
    pub fn new(
        extractor: Box<dyn InfoExtractor>,
        backend: Box<dyn DownloaderBackend>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            extractor,
            backend,
            config,
            progress: ProgressEmitter::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressEmitter) -> Self {
        self.progress = progress;
        self
    }

    pub async fn run(
        &self,
        options: &DownloadOptions,
        request: &FormatRequest,
    ) -> Result<DownloadOutcome, DownloadError> {
        // step 1: metadata and available tracks
        let start = Instant::now();
        info!("get metadata '{}' via {}", options.video, self.extractor.name());

        let info = self.extractor.extract(&options.video, &self.config).await?;
        let catalog = &info.catalog;

        let title = sanitize_filename_utf16(catalog.title_or_id());
        let channel = sanitize_filename_utf16(catalog.channel_name());
        if let Some(uploaded) = catalog.timestamp.and_then(format_timestamp) {
            info!("'{}' by {} uploaded {}", title, channel, uploaded);
        }

        let exported_json = export_json(&options.output_dir, &channel, &title, &info.raw)?;

        let mut sink = TracingSink;
        let report = format_selector::select(catalog, options.forced_language(), &mut sink);

        let skipped = &report.result().skipped_languages;
        if !skipped.is_empty() {
            info!("languages skipped {:?}", skipped);
        }

        let result = report.require_audio().map_err(|e| {
            error!("no audio '{}' available", report.result().language);
            DownloadError::from(e)
        })?;
        let format = result.format_spec(request)?;

        info!(
            "{:.2} sec => '{}' ({})",
            start.elapsed().as_secs_f64(),
            title,
            format
        );

        let mut outcome = DownloadOutcome {
            video_id: options.video.to_string(),
            title: title.clone(),
            language: result.language.clone(),
            format: format.to_string(),
            exported_json,
            downloaded: false,
        };

        if options.dry_run {
            info!("dry run, skipping download");
            return Ok(outcome);
        }

        // step 2: audio/video download
        if !self.backend.is_available() {
            warn!("{} backend does not answer to --version", self.backend.name());
        }

        let job = DownloadJob {
            video: options.video.clone(),
            title,
            format,
            audio_only: request.audio_only,
            output_dir: options.output_dir.clone(),
        };

        let start = Instant::now();
        self.backend.download(&job, &self.progress).await?;
        info!("downloaded {:.2} sec", start.elapsed().as_secs_f64());

        outcome.downloaded = true;
        Ok(outcome)
    }
}
