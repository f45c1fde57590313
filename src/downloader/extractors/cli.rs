// CLI InfoExtractor - runs `yt-dlp --dump-json` for one video

use async_trait::async_trait;
use std::process::Command as StdCommand;
use tracing::{debug, info, warn};

use super::diagnostics::{analyze_error, get_blocking_suggestion};
use super::traits::{ExtractedInfo, ExtractorConfig, InfoExtractor};
use crate::downloader::errors::DownloadError;
use crate::downloader::models::VideoId;
use crate::downloader::utils::{get_cookie_args, get_proxy_args, run_output_with_timeout};

/// Find yt-dlp binary
pub fn find_ytdlp() -> String {
    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if std::path::Path::new(path).exists() {
            return path.to_string();
        }
    }

    // Try to find via `which`
    if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    "yt-dlp".to_string()
}

/// CLI-based info extractor using yt-dlp binary
pub struct CliInfoExtractor {
    ytdlp_path: String,
}

impl CliInfoExtractor {
    pub fn new() -> Self {
        Self {
            ytdlp_path: find_ytdlp(),
        }
    }

    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            ytdlp_path: path.into(),
        }
    }

    pub fn ytdlp_path(&self) -> &str {
        &self.ytdlp_path
    }

    /// Check if yt-dlp binary is available
    fn has_ytdlp_binary(&self) -> bool {
        match StdCommand::new(&self.ytdlp_path).arg("--version").output() {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    /// Build command arguments
    fn build_args(video: &VideoId, config: &ExtractorConfig) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            config.timeout_seconds.to_string(),
            "--retries".to_string(),
            "2".to_string(),
        ];

        if config.print_traffic {
            args.push("--print-traffic".to_string());
        }

        args.extend(get_cookie_args(config));
        args.extend(get_proxy_args(config));

        // `--` keeps ids starting with '-' from being read as options
        args.push("--".to_string());
        args.push(video.watch_url());
        args
    }

    fn parse_json(stdout: &[u8]) -> Result<ExtractedInfo, DownloadError> {
        let json_str = String::from_utf8_lossy(stdout);
        let raw: serde_json::Value = serde_json::from_str(&json_str)?;

        if !raw["formats"].is_array() {
            return Err(DownloadError::ParseError(
                "No formats array in JSON".to_string(),
            ));
        }

        ExtractedInfo::from_value(raw)
    }
}

impl Default for CliInfoExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InfoExtractor for CliInfoExtractor {
    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }

    fn is_available(&self) -> bool {
        self.has_ytdlp_binary()
    }

    async fn extract(
        &self,
        video: &VideoId,
        config: &ExtractorConfig,
    ) -> Result<ExtractedInfo, DownloadError> {
        if !self.is_available() {
            return Err(DownloadError::ToolNotFound(format!(
                "yt-dlp binary not found ({})",
                self.ytdlp_path
            )));
        }

        let args = Self::build_args(video, config);
        info!("[{}] extracting {}", self.name(), video);
        debug!("{} {}", self.ytdlp_path, args.join(" "));

        // yt-dlp needs some headroom over its own socket timeout
        let budget = config.timeout_seconds.saturating_mul(3);
        let out = run_output_with_timeout(&self.ytdlp_path, args, budget)
            .await
            .map_err(DownloadError::from)?;

        if out.status.success() {
            return Self::parse_json(&out.stdout);
        }

        let stderr = String::from_utf8_lossy(&out.stderr).to_string();
        let diagnostics = analyze_error(&stderr);
        warn!(
            "[{}] {} (severity {}): {}",
            self.name(),
            diagnostics.reason.description(),
            diagnostics.severity,
            diagnostics.context.as_deref().unwrap_or(stderr.trim())
        );
        info!(
            "{}",
            get_blocking_suggestion(&diagnostics.reason, config.proxy.as_deref())
        );

        Err(DownloadError::from(stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let video = VideoId::parse("-nBp0gR_WXs").unwrap();
        let config = ExtractorConfig::default()
            .with_timeout(20)
            .with_print_traffic(true)
            .with_proxy(Some("socks5h://127.0.0.1:1080".to_string()));

        let args = CliInfoExtractor::build_args(&video, &config);

        assert_eq!(args[0], "--dump-json");
        assert!(args.windows(2).any(|w| w == ["--socket-timeout", "20"]));
        assert!(args.contains(&"--print-traffic".to_string()));
        assert!(args.windows(2).any(|w| w == ["--proxy", "socks5h://127.0.0.1:1080"]));
        assert_eq!(
            &args[args.len() - 2..],
            ["--", "https://www.youtube.com/watch?v=-nBp0gR_WXs"]
        );
    }

    #[test]
    fn test_parse_json_keeps_raw_document() {
        let stdout = br#"{"id": "abcdefghijk", "title": "T", "formats": [{"format_id": "140"}]}"#;
        let info = CliInfoExtractor::parse_json(stdout).unwrap();
        assert_eq!(info.catalog.id, "abcdefghijk");
        assert_eq!(info.catalog.formats.len(), 1);
        assert_eq!(info.raw["title"], "T");
    }

    #[test]
    fn test_parse_json_without_formats() {
        let err = CliInfoExtractor::parse_json(br#"{"id": "abcdefghijk"}"#).unwrap_err();
        assert!(matches!(err, DownloadError::ParseError(_)));
    }

    #[test]
    fn test_missing_binary() {
        let extractor = CliInfoExtractor::with_path("/nonexistent/yt-dlp");
        assert!(!extractor.is_available());
    }
}
