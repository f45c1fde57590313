// Application configuration (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::downloader::extractors::ExtractorConfig;
use crate::downloader::format_selector::FormatRequest;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default forced audio language, empty = resolve from the catalog
    pub language: String,
    pub format: FormatConfig,
    pub output: OutputConfig,
    pub extractor: ExtractorSettings,
}

/// Codec families in preference order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    pub normal: NormalFormat,
    pub audio_only: AudioOnlyFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalFormat {
    pub audio_codecs: Vec<String>,
    pub video_codecs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioOnlyFormat {
    pub audio_codecs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub video_dir: PathBuf,
    pub audio_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// yt-dlp binary, searched in the usual places when unset
    pub ytdlp_path: Option<String>,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub cookies_path: Option<String>,
    pub cookies_from_browser: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: "de".to_string(),
            format: FormatConfig::default(),
            output: OutputConfig::default(),
            extractor: ExtractorSettings::default(),
        }
    }
}

impl Default for NormalFormat {
    fn default() -> Self {
        Self {
            audio_codecs: vec!["opus".to_string(), "mp4a".to_string()],
            video_codecs: vec!["vp09".to_string(), "av01".to_string(), "avc1".to_string()],
        }
    }
}

impl Default for AudioOnlyFormat {
    fn default() -> Self {
        Self {
            audio_codecs: vec!["mp4a".to_string(), "opus".to_string()],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            video_dir: dirs::video_dir()
                .unwrap_or_else(|| PathBuf::from("data").join("video")),
            audio_dir: dirs::audio_dir()
                .unwrap_or_else(|| PathBuf::from("data").join("audio")),
        }
    }
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            timeout_seconds: 60,
            proxy: None,
            cookies_path: None,
            cookies_from_browser: None,
        }
    }
}

impl AppConfig {
    /// Load the configuration
    ///
    /// An explicit `path` must exist; the default location may be missing,
    /// in which case the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::load_from_file(&default_path)?
                } else {
                    debug!("no config at {}, using defaults", default_path.display());
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Get the default configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("yt-format-select")
            .join("config.toml")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format.normal.audio_codecs.is_empty() {
            return Err(ConfigError::Invalid(
                "format.normal.audio_codecs must not be empty".to_string(),
            ));
        }
        if self.format.normal.video_codecs.is_empty() {
            return Err(ConfigError::Invalid(
                "format.normal.video_codecs must not be empty".to_string(),
            ));
        }
        if self.format.audio_only.audio_codecs.is_empty() {
            return Err(ConfigError::Invalid(
                "format.audio_only.audio_codecs must not be empty".to_string(),
            ));
        }
        if self.extractor.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "extractor.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Codec preferences for a download
    pub fn format_request(&self, audio_only: bool) -> FormatRequest {
        if audio_only {
            FormatRequest {
                audio_codecs: self.format.audio_only.audio_codecs.clone(),
                video_codecs: Vec::new(),
                audio_only: true,
            }
        } else {
            FormatRequest {
                audio_codecs: self.format.normal.audio_codecs.clone(),
                video_codecs: self.format.normal.video_codecs.clone(),
                audio_only: false,
            }
        }
    }

    pub fn output_dir(&self, audio_only: bool) -> &Path {
        if audio_only {
            &self.output.audio_dir
        } else {
            &self.output.video_dir
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig::default()
            .with_proxy(self.extractor.proxy.clone())
            .with_cookies_path(self.extractor.cookies_path.clone())
            .with_cookies_from_browser(self.extractor.cookies_from_browser.clone())
            .with_timeout(self.extractor.timeout_seconds)
    }
}
