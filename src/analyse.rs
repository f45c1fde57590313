// Offline analysis of exported catalog files

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::downloader::errors::DownloadError;
use crate::downloader::format_selector::{self, MediaCatalog, RecordingSink, SelectionReport, TeeSink, TracingSink};

/// Selection outcome for one catalog file
#[derive(Debug, Clone, Serialize)]
pub struct CatalogAnalysis {
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SelectionReport>,
    pub skips: Vec<String>,
    pub anomalies: Vec<String>,
    /// Set when the file could not be read or parsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `.json` files below `path`, sorted by name; a file path is returned as is
pub fn catalog_files(path: &Path) -> Result<Vec<PathBuf>, DownloadError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(DownloadError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let files = WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
        .collect();

    Ok(files)
}

fn load_catalog(path: &Path) -> Result<MediaCatalog, DownloadError> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    Ok(MediaCatalog::from_value(value)?)
}

pub fn analyse_file(path: &Path, forced_language: Option<&str>) -> CatalogAnalysis {
    info!("analyse '{}'", path.display());

    let catalog = match load_catalog(path) {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!("{}: {}", path.display(), e);
            return CatalogAnalysis {
                file: path.to_path_buf(),
                report: None,
                skips: Vec::new(),
                anomalies: Vec::new(),
                error: Some(e.to_string()),
            };
        }
    };

    let mut sink = TeeSink(TracingSink, RecordingSink::default());
    let report = format_selector::select(&catalog, forced_language, &mut sink);
    let TeeSink(_, recorded) = sink;

    CatalogAnalysis {
        file: path.to_path_buf(),
        report: Some(report),
        skips: recorded.skips.iter().map(ToString::to_string).collect(),
        anomalies: recorded.anomalies.iter().map(ToString::to_string).collect(),
        error: None,
    }
}

/// Analyse one file or every catalog below a directory
pub fn analyse_path(path: &Path, forced_language: Option<&str>) -> Result<Vec<CatalogAnalysis>, DownloadError> {
    let files = catalog_files(path)?;
    info!("{} catalog file(s) under {}", files.len(), path.display());

    Ok(files
        .iter()
        .map(|file| analyse_file(file, forced_language))
        .collect())
}
