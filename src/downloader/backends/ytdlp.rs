use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::process::{Command as StdCommand, Stdio};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tracing::{debug, error, info};

use crate::downloader::errors::DownloadError;
use crate::downloader::extractors::{analyze_error, find_ytdlp, get_blocking_suggestion, ExtractorConfig};
use crate::downloader::models::{DownloadJob, DownloadProgress};
use crate::downloader::traits::{DownloaderBackend, ProgressEmitter};
use crate::downloader::utils::{get_cookie_args, get_proxy_args};

lazy_static! {
    // [download]  12.5% of ~ 310.04MiB at  374.36KiB/s ETA 11:59 (frag 56/454)
    static ref PROGRESS_RE: Regex = Regex::new(
        r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)(?:\s+at\s+(\S+/s))?(?:\s+ETA\s+(\S+))?(?:\s+\(frag\s+(\d+)/(\d+)\))?"
    )
    .unwrap();
    static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
    static ref MERGE_RE: Regex = Regex::new(r"\[Merger?\]\s+Merging").unwrap();
    static ref EXTRACT_RE: Regex = Regex::new(r"\[ExtractAudio\]\s+Destination:\s+(.+)").unwrap();
    static ref ALREADY_RE: Regex = Regex::new(r"has already been downloaded").unwrap();
}

/// Parse one `--newline` output line of yt-dlp
pub fn parse_ytdlp_progress(line: &str) -> Option<DownloadProgress> {
    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let size = caps.get(2).map_or("?", |m| m.as_str());

        let mut status = format!("of {}", size);
        if let Some(speed) = caps.get(3) {
            status.push_str(&format!(" @ {}", speed.as_str()));
        }
        if let Some(eta) = caps.get(4) {
            status.push_str(&format!(" ETA {}", eta.as_str()));
        }
        if let (Some(current), Some(total)) = (caps.get(5), caps.get(6)) {
            status.push_str(&format!(" (frag {}/{})", current.as_str(), total.as_str()));
        }
        return Some(DownloadProgress { percent, status });
    }

    if let Some(caps) = DEST_RE.captures(line) {
        return Some(DownloadProgress {
            percent: 0.0,
            status: format!("starting {}", file_name(&caps[1])),
        });
    }

    if let Some(caps) = EXTRACT_RE.captures(line) {
        return Some(DownloadProgress {
            percent: 100.0,
            status: format!("extracting audio to {}", file_name(&caps[1])),
        });
    }

    if MERGE_RE.is_match(line) {
        return Some(DownloadProgress {
            percent: 99.0,
            status: "merging video and audio".to_string(),
        });
    }

    if ALREADY_RE.is_match(line) {
        return Some(DownloadProgress {
            percent: 100.0,
            status: "file already downloaded".to_string(),
        });
    }

    None
}

fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path).trim()
}

/// Emits a downloading line only when it enters a new 10% step
#[derive(Default)]
struct Throttle {
    last_step: Option<u32>,
}

impl Throttle {
    fn admit(&mut self, progress: &DownloadProgress) -> bool {
        let step = (progress.percent.clamp(0.0, 100.0) / 10.0) as u32;
        if self.last_step == Some(step) {
            return false;
        }
        self.last_step = Some(step);
        true
    }
}

pub struct YtDlpBackend {
    ytdlp_path: String,
    config: ExtractorConfig,
}

impl YtDlpBackend {
    pub fn new(config: ExtractorConfig) -> Self {
        Self::with_path(find_ytdlp(), config)
    }

    pub fn with_path(path: impl Into<String>, config: ExtractorConfig) -> Self {
        Self {
            ytdlp_path: path.into(),
            config,
        }
    }

    fn build_args(&self, job: &DownloadJob) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            job.format.to_string(),
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--no-update".to_string(),
            "--socket-timeout".to_string(),
            self.config.timeout_seconds.to_string(),
            "--retries".to_string(),
            "5".to_string(),
            "--fragment-retries".to_string(),
            "50".to_string(),
            "-o".to_string(),
            job.output_template(),
        ];

        if job.audio_only {
            args.push("-x".to_string());
        }

        if self.config.print_traffic {
            args.push("--print-traffic".to_string());
        }

        args.extend(get_cookie_args(&self.config));
        args.extend(get_proxy_args(&self.config));

        args.push("--".to_string());
        args.push(job.video.watch_url());
        args
    }
}

#[async_trait]
impl DownloaderBackend for YtDlpBackend {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn is_available(&self) -> bool {
        StdCommand::new(&self.ytdlp_path)
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    async fn download(&self, job: &DownloadJob, progress: &ProgressEmitter) -> Result<(), DownloadError> {
        let args = self.build_args(job);
        info!("[{}] downloading {} ({})", self.name(), job.video, job.format);
        debug!("{} {}", self.ytdlp_path, args.join(" "));

        let mut child = TokioCommand::new(&self.ytdlp_path)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::ToolNotFound(format!("Failed to start {}: {}", self.ytdlp_path, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stderr".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut collected = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                collected.push(line);
            }
            collected.join("\n")
        });

        let mut throttle = Throttle::default();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_ytdlp_progress(&line) {
                Some(update) => {
                    if throttle.admit(&update) {
                        progress.emit(update);
                    }
                }
                None => debug!("[yt-dlp] {}", line),
            }
        }

        let status = child.wait().await?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if status.success() {
            info!("[{}] done: {}", self.name(), job.output_template());
            return Ok(());
        }

        let diagnostics = analyze_error(&stderr_output);
        error!(
            "[{}] {}: {}",
            self.name(),
            diagnostics.reason.description(),
            diagnostics.context.as_deref().unwrap_or(stderr_output.trim())
        );
        info!(
            "{}",
            get_blocking_suggestion(&diagnostics.reason, self.config.proxy.as_deref())
        );

        if stderr_output.trim().is_empty() {
            return Err(DownloadError::ExecutionError(format!("yt-dlp exited with {}", status)));
        }
        Err(DownloadError::from(stderr_output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::format_selector::{FormatSpec, TrackChoice};
    use crate::downloader::models::VideoId;
    use std::path::PathBuf;

    fn job(audio_only: bool) -> DownloadJob {
        let choice = |id: &str| TrackChoice {
            format_id: id.to_string(),
            quality: 3,
        };
        DownloadJob {
            video: VideoId::parse("dQw4w9WgXcQ").unwrap(),
            title: "Title".to_string(),
            format: FormatSpec {
                audio: choice("251-1"),
                video: (!audio_only).then(|| choice("248")),
            },
            audio_only,
            output_dir: PathBuf::from("/out"),
        }
    }

    #[test]
    fn test_parse_fragment_progress() {
        let line = "[download]  12.5% of ~ 310.04MiB at  374.36KiB/s ETA 11:59 (frag 56/454)";
        let progress = parse_ytdlp_progress(line).unwrap();
        assert_eq!(progress.percent, 12.5);
        assert_eq!(progress.status, "of 310.04MiB @ 374.36KiB/s ETA 11:59 (frag 56/454)");
    }

    #[test]
    fn test_parse_finished_line() {
        let progress = parse_ytdlp_progress("[download] 100% of   3.37MiB in 00:00:01 at 2.71MiB/s").unwrap();
        assert_eq!(progress.percent, 100.0);
        assert!(progress.status.starts_with("of 3.37MiB"));
    }

    #[test]
    fn test_parse_destination_and_merge() {
        let progress = parse_ytdlp_progress("[download] Destination: /out/Chan/Title (248+251-1).f248.webm").unwrap();
        assert_eq!(progress.percent, 0.0);
        assert_eq!(progress.status, "starting Title (248+251-1).f248.webm");

        let progress = parse_ytdlp_progress("[Merger] Merging formats into \"x.webm\"").unwrap();
        assert_eq!(progress.percent, 99.0);
    }

    #[test]
    fn test_unrelated_line() {
        assert!(parse_ytdlp_progress("[youtube] dQw4w9WgXcQ: Downloading webpage").is_none());
    }

    #[test]
    fn test_throttle_by_decile() {
        let mut throttle = Throttle::default();
        let at = |percent: f32| DownloadProgress {
            percent,
            status: String::new(),
        };
        assert!(throttle.admit(&at(0.5)));
        assert!(!throttle.admit(&at(7.0)));
        assert!(throttle.admit(&at(10.2)));
        assert!(throttle.admit(&at(100.0)));
        assert!(throttle.admit(&at(0.0)));
    }

    #[test]
    fn test_build_args_video() {
        let backend = YtDlpBackend::with_path("yt-dlp", ExtractorConfig::default());
        let args = backend.build_args(&job(false));

        assert_eq!(&args[..2], ["-f", "248+251-1"]);
        assert!(args.contains(&"--newline".to_string()));
        assert!(!args.contains(&"-x".to_string()));
        assert!(args
            .windows(2)
            .any(|w| w == ["-o", "/out/%(uploader)s/Title (248+251-1).%(ext)s"]));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_build_args_audio_only() {
        let config = ExtractorConfig::default()
            .with_print_traffic(true)
            .with_cookies_from_browser(Some("firefox".to_string()));
        let backend = YtDlpBackend::with_path("yt-dlp", config);
        let args = backend.build_args(&job(true));

        assert_eq!(&args[..2], ["-f", "251-1"]);
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"--print-traffic".to_string()));
        assert!(args.windows(2).any(|w| w == ["--cookies-from-browser", "firefox"]));
    }
}
