// Error types for the extract/select/download flow

use thiserror::Error;

use super::format_selector::SelectionError;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network timeout while talking to YouTube
    #[error("Network timeout: YouTube is not responding")]
    NetworkTimeout,

    /// YouTube blocked the request (429, bot detection, etc.)
    #[error(
        "YouTube is temporarily throttling requests from your IP address.\n\
         This usually resolves on its own in 6-24 hours.\n\n\
         What you can do:\n\
         1) Wait and try again later\n\
         2) Use a proxy (--proxy)\n\
         3) Try a different network"
    )]
    BlockedByYouTube,

    /// yt-dlp not found in system
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid video id or URL
    #[error("Invalid video id: {0}")]
    InvalidVideoId(String),

    /// Failed to parse yt-dlp JSON output
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Command execution failed
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// No usable track for the request
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unknown error with details
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<serde_json::Error> for DownloadError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(format!("Invalid JSON: {}", e))
    }
}

// Classify raw yt-dlp stderr / process errors
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        // IP blocking detection (most important)
        if (s.contains("timeout") || s.contains("timed out")) && s.contains("youtube.com") {
            return Self::BlockedByYouTube;
        }

        if s.contains("timeout") || s.contains("timed out") {
            return Self::NetworkTimeout;
        }

        if s.contains("429") || s.contains("bot") || s.contains("blocked") {
            return Self::BlockedByYouTube;
        }

        if s.contains("not found") || s.contains("No such file") || s.contains("command not found") {
            return Self::ToolNotFound(s);
        }

        if s.contains("parse") || s.contains("JSON") {
            return Self::ParseError(s);
        }

        if s.contains("Incomplete YouTube ID") || s.contains("Unsupported URL") {
            return Self::InvalidVideoId(s);
        }

        Self::Unknown(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_on_youtube_is_blocking() {
        let err = DownloadError::from("Read timed out (youtube.com)".to_string());
        assert!(matches!(err, DownloadError::BlockedByYouTube));
    }

    #[test]
    fn test_plain_timeout() {
        let err = DownloadError::from("Timed out after 30s - connection timeout".to_string());
        assert!(matches!(err, DownloadError::NetworkTimeout));
    }

    #[test]
    fn test_rate_limit() {
        let err = DownloadError::from("HTTP Error 429: Too Many Requests".to_string());
        assert!(matches!(err, DownloadError::BlockedByYouTube));
    }

    #[test]
    fn test_unknown_keeps_message() {
        let err = DownloadError::from("something odd".to_string());
        assert_eq!(err.to_string(), "Unknown error: something odd");
    }

    #[test]
    fn test_selection_error_is_transparent() {
        let err = DownloadError::from(SelectionError::NoAudio {
            language: "de".to_string(),
        });
        assert_eq!(err.to_string(), "no audio track available for language 'de'");
    }
}
