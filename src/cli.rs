use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Pick the best audio and video formats of a YouTube video and download them.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Config file (TOML). Defaults to <config dir>/yt-format-select/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Additionally write a daily rolling log file into this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Select formats for a video and download them
    Download(DownloadArgs),

    /// Run the selection over exported catalog JSON files and print the reports
    Analyse(AnalyseArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct DownloadArgs {
    /// YouTube id (11 characters) or a watch/shorts/youtu.be URL.
    /// Put `--` before ids starting with '-'
    pub video: String,

    /// Audio language (primary subtag, e.g. "de"). Empty string = original language.
    /// Defaults to the configured language
    #[arg(short, long)]
    pub language: Option<String>,

    /// Only the audio track
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub audio: bool,

    /// Debug logs and yt-dlp --print-traffic
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Output directory. Overrides [output] video_dir / audio_dir
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// HTTP/SOCKS proxy URL, e.g. socks5h://127.0.0.1:1080
    #[arg(long = "proxy")]
    pub proxy: Option<String>,

    /// Cookies file in Netscape format
    #[arg(long = "cookies")]
    pub cookies: Option<String>,

    /// Select and print the format expression, do not download
    #[arg(long, action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AnalyseArgs {
    /// A catalog .json file or a directory searched recursively
    pub path: PathBuf,

    /// Audio language (primary subtag). Defaults to the configured language
    #[arg(short, long)]
    pub language: Option<String>,

    /// Debug logs (candidate tables)
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
}

impl Args {
    pub fn debug(&self) -> bool {
        match &self.command {
            Command::Download(args) => args.debug,
            Command::Analyse(args) => args.debug,
        }
    }
}
