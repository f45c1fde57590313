pub mod analyse;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod logging;

pub use downloader::format_selector::{select, SelectionReport, SelectionResult};
