// Helper functions shared by extraction and download

use std::path::{Path, PathBuf};
use std::process::Stdio;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};
use tracing::{debug, info, warn};

use crate::downloader::errors::DownloadError;
use crate::downloader::extractors::ExtractorConfig;

/// Run command with timeout (shared utility)
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, String> {
    debug!("{} {}", program, args.join(" "));

    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("Failed to start {}: {}", program, e))?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| format!("Failed to capture stdout from {}", program))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| format!("Failed to capture stderr from {}", program))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stdout: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe
            .read_to_end(&mut buf)
            .await
            .map_err(|e| format!("Failed to read stderr: {}", e))?;
        Ok::<Vec<u8>, String>(buf)
    });

    let waited = timeout(TokioDuration::from_secs(timeout_secs), child.wait()).await;
    match waited {
        Ok(status_res) => {
            let status = status_res.map_err(|e| format!("Failed to wait for {}: {}", program, e))?;
            let stdout = stdout_task
                .await
                .map_err(|e| format!("stdout task failed: {}", e))??;
            let stderr = stderr_task
                .await
                .map_err(|e| format!("stderr task failed: {}", e))??;
            Ok(std::process::Output { status, stdout, stderr })
        }
        Err(_) => {
            warn!("{} timed out after {}s, killing it", program, timeout_secs);
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(format!("Timed out after {}s", timeout_secs))
        }
    }
}

/// Build proxy arguments for yt-dlp
pub fn get_proxy_args(config: &ExtractorConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(proxy) = &config.proxy {
        args.push("--proxy".to_string());
        args.push(proxy.clone());
    }

    args
}

/// Build cookie arguments for yt-dlp (cookies file wins over browser)
pub fn get_cookie_args(config: &ExtractorConfig) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(path) = &config.cookies_path {
        args.push("--cookies".to_string());
        args.push(path.clone());
    } else if let Some(browser) = &config.cookies_from_browser {
        args.push("--cookies-from-browser".to_string());
        args.push(browser.clone());
    }

    args
}

/// Make `text` usable as a file name without losing its look
///
/// Reserved characters become their full-width Unicode forms, `"` becomes `'`.
pub fn sanitize_filename_utf16(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '<' => '\u{ff1c}',
            '>' => '\u{ff1e}',
            ':' => '\u{ff1a}',
            '/' => '\u{ff0f}',
            '|' => '\u{ff5c}',
            '?' => '\u{ff1f}',
            '*' => '\u{ff0a}',
            '\\' => '\u{ff3c}',
            '"' => '\'',
            other => other,
        })
        .collect()
}

/// Write the raw catalog to `<dir>/<channel>/<title>.json`
pub fn export_json(
    dir: &Path,
    channel: &str,
    title: &str,
    data: &serde_json::Value,
) -> Result<PathBuf, DownloadError> {
    let folder = dir.join(sanitize_filename_utf16(channel));
    std::fs::create_dir_all(&folder)?;

    let path = folder.join(format!("{}.json", sanitize_filename_utf16(title)));
    let text = serde_json::to_string_pretty(data)?;
    std::fs::write(&path, text)?;

    info!("exported catalog to {}", path.display());
    Ok(path)
}

/// Unix timestamp from yt-dlp as RFC 3339
pub fn format_timestamp(timestamp: f64) -> Option<String> {
    OffsetDateTime::from_unix_timestamp(timestamp as i64)
        .ok()?
        .format(&Rfc3339)
        .ok()
}
