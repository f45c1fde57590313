use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use yt_format_select::analyse::analyse_path;
use yt_format_select::cli::{AnalyseArgs, Args, Command, DownloadArgs};
use yt_format_select::config::AppConfig;
use yt_format_select::downloader::backends::YtDlpBackend;
use yt_format_select::downloader::extractors::CliInfoExtractor;
use yt_format_select::downloader::{DownloadOptions, Downloader, VideoId};
use yt_format_select::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_logging(args.debug(), args.log_dir.as_deref());

    let config = AppConfig::load(args.config.as_deref()).context("load config failed")?;

    match args.command {
        Command::Download(download) => run_download(download, config).await,
        Command::Analyse(analyse) => run_analyse(analyse, config),
    }
}

async fn run_download(args: DownloadArgs, mut config: AppConfig) -> Result<()> {
    let video = VideoId::parse(&args.video).context("invalid video id")?;

    if args.proxy.is_some() {
        config.extractor.proxy = args.proxy.clone();
    }
    if args.cookies.is_some() {
        config.extractor.cookies_path = args.cookies.clone();
    }

    let mut options = DownloadOptions::new(video);
    options.language = args.language.clone().unwrap_or_else(|| config.language.clone());
    options.audio_only = args.audio;
    options.debug = args.debug;
    options.dry_run = args.dry_run;
    options.output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.output_dir(args.audio).to_path_buf());

    let extractor_config = config.extractor_config().with_print_traffic(args.debug);
    let (extractor, backend) = match &config.extractor.ytdlp_path {
        Some(path) => (
            CliInfoExtractor::with_path(path.clone()),
            YtDlpBackend::with_path(path.clone(), extractor_config.clone()),
        ),
        None => (CliInfoExtractor::new(), YtDlpBackend::new(extractor_config.clone())),
    };
    info!("using {}", extractor.ytdlp_path());

    let downloader = Downloader::new(Box::new(extractor), Box::new(backend), extractor_config);
    let request = config.format_request(args.audio);

    match downloader.run(&options, &request).await {
        Ok(outcome) => {
            if outcome.downloaded {
                info!("'{}' ({}) done", outcome.title, outcome.format);
            } else {
                println!("{}", outcome.format);
            }
            Ok(())
        }
        Err(e) => {
            error!("{}", e);
            Err(anyhow::Error::new(e).context(format!("download of {} failed", options.video)))
        }
    }
}

fn run_analyse(args: AnalyseArgs, config: AppConfig) -> Result<()> {
    let language = args.language.unwrap_or(config.language);
    let forced = Some(language.as_str()).filter(|l| !l.trim().is_empty());

    let results = analyse_path(&args.path, forced)
        .with_context(|| format!("analyse {} failed", args.path.display()))?;

    let json = serde_json::to_string_pretty(&results).context("serialize reports failed")?;
    println!("{}", json);
    Ok(())
}
