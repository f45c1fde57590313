// InfoExtractor module - fetches the format catalog of a video
//
// The CLI extractor runs `yt-dlp --dump-json`; failures are classified by
// `diagnostics` so the user sees a reason instead of raw stderr.

mod cli;
mod diagnostics;
mod traits;

pub use cli::{find_ytdlp, CliInfoExtractor};
pub use diagnostics::{analyze_error, diagnose_error, get_blocking_suggestion, BlockingDiagnostics, BlockingReason};
pub use traits::{ExtractedInfo, ExtractorConfig, InfoExtractor};
