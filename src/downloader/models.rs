// Common data models for downloader

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::errors::DownloadError;
use super::format_selector::FormatSpec;

lazy_static! {
    static ref VIDEO_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap();
    static ref URL_ID_RE: Regex = Regex::new(
        r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})"
    )
    .unwrap();
}

/// YouTube video id (always 11 characters)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Accepts a bare id or a watch/shorts/youtu.be URL
    ///
    /// A 10-character id lost its leading '-' to the shell's option parser
    /// and gets it back.
    pub fn parse(input: &str) -> Result<Self, DownloadError> {
        let input = input.trim();

        if let Some(caps) = URL_ID_RE.captures(input) {
            return Ok(Self(caps[1].to_string()));
        }

        let candidate = if input.len() == 10 {
            format!("-{}", input)
        } else {
            input.to_string()
        };

        if VIDEO_ID_RE.is_match(&candidate) {
            Ok(Self(candidate))
        } else {
            Err(DownloadError::InvalidVideoId(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Download options
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub video: VideoId,
    /// Forced audio language, empty = resolve from the catalog
    pub language: String,
    pub audio_only: bool,
    pub output_dir: PathBuf,
    /// yt-dlp --print-traffic
    pub debug: bool,
    /// Select and print the format expression, skip the download
    pub dry_run: bool,
}

impl DownloadOptions {
    pub fn new(video: VideoId) -> Self {
        Self {
            video,
            language: String::new(),
            audio_only: false,
            output_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            debug: false,
            dry_run: false,
        }
    }

    pub fn forced_language(&self) -> Option<&str> {
        let language = self.language.trim();
        (!language.is_empty()).then_some(language)
    }
}

/// Everything a backend needs to fetch one selection
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub video: VideoId,
    /// Sanitized title used in the output file name
    pub title: String,
    pub format: FormatSpec,
    pub audio_only: bool,
    pub output_dir: PathBuf,
}

impl DownloadJob {
    /// yt-dlp output template: `<dir>/%(uploader)s/<title> (<format>).%(ext)s`
    pub fn output_template(&self) -> String {
        // literal '%' must not be read as a template field
        let title = self.title.replace('%', "%%");
        self.output_dir
            .join("%(uploader)s")
            .join(format!("{} ({}).%(ext)s", title, self.format))
            .to_string_lossy()
            .to_string()
    }
}

/// Download progress information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub percent: f32,
    pub status: String,
}
