// Backend implementations

pub mod ytdlp;

pub use ytdlp::{parse_ytdlp_progress, YtDlpBackend};
