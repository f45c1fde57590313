// Selection diagnostics - observations emitted while selecting formats
//
// The engine never logs on its own: every benign skip, anomaly and the final
// report go through an injected DiagnosticsSink.

use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info};

use super::report::SelectionReport;

/// Expected exclusion, not an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    /// mhtml / m3u8_native / http_dash_segments
    StreamingProtocol { format_id: String, protocol: String },
    /// "DRC" duplicate of a regular audio format
    DynamicRangeCompressed { format_id: String },
    /// Neither audio nor video codec (storyboards, images)
    NoCodec { format_id: String },
    /// Audio+video in one format, never ranked
    Combined { format_id: String },
    /// Audio dropped by forced language or language preference
    Language { format_id: String, language: String },
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamingProtocol { format_id, protocol } => {
                write!(f, "skip '{}' ({})", protocol, format_id)
            }
            Self::DynamicRangeCompressed { format_id } => write!(f, "skip DRC format {}", format_id),
            Self::NoCodec { format_id } => write!(f, "skip format {} without codecs", format_id),
            Self::Combined { format_id } => write!(f, "skip combined audio+video format {}", format_id),
            Self::Language { format_id, language } => {
                write!(f, "skip audio {} in language '{}'", format_id, language)
            }
        }
    }
}

/// Unexpected catalog content; the affected entry or partition is left out
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Anomaly {
    #[error("format #{index} is malformed: {reason}")]
    MalformedDescriptor { index: usize, reason: String },

    #[error("unknown protocol '{protocol}' for format {format_id} - expected 'https'")]
    UnexpectedProtocol { format_id: String, protocol: String },

    #[error("language '{language}' not found")]
    LanguageNotFound { language: String },
}

/// Receiver for everything the selection engine observes
pub trait DiagnosticsSink {
    fn skip(&mut self, skip: Skip);

    fn anomaly(&mut self, anomaly: Anomaly);

    fn report(&mut self, report: &SelectionReport);
}

/// Sink that forwards to `tracing`
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn skip(&mut self, skip: Skip) {
        info!("{}", skip);
    }

    fn anomaly(&mut self, anomaly: Anomaly) {
        error!("{}", anomaly);
    }

    fn report(&mut self, report: &SelectionReport) {
        for collision in &report.collisions {
            info!(
                "format id {} reused for languages {:?}",
                collision.format_id, collision.languages
            );
        }

        for (family, rows) in &report.video_candidates {
            debug!("video: {}", family);
            for row in rows {
                debug!("{}", row);
            }
        }
        for (language, families) in &report.audio_candidates {
            for (family, rows) in families {
                debug!("audio: {} - {}", language, family);
                for row in rows {
                    debug!("{}", row);
                }
            }
        }

        info!(
            media_id = %report.media_id,
            language = %report.result.language,
            "video: {:?} audio: {:?} skipped: {:?}",
            report.result.video,
            report.result.audio,
            report.result.skipped_languages
        );
    }
}

/// Sink that keeps everything in memory (tests, analyse mode)
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub skips: Vec<Skip>,
    pub anomalies: Vec<Anomaly>,
    pub reports: usize,
}

impl DiagnosticsSink for RecordingSink {
    fn skip(&mut self, skip: Skip) {
        self.skips.push(skip);
    }

    fn anomaly(&mut self, anomaly: Anomaly) {
        self.anomalies.push(anomaly);
    }

    fn report(&mut self, _report: &SelectionReport) {
        self.reports += 1;
    }
}

/// Forwards everything to both sinks
#[derive(Debug, Default)]
pub struct TeeSink<A, B>(pub A, pub B);

impl<A: DiagnosticsSink, B: DiagnosticsSink> DiagnosticsSink for TeeSink<A, B> {
    fn skip(&mut self, skip: Skip) {
        self.0.skip(skip.clone());
        self.1.skip(skip);
    }

    fn anomaly(&mut self, anomaly: Anomaly) {
        self.0.anomaly(anomaly.clone());
        self.1.anomaly(anomaly);
    }

    fn report(&mut self, report: &SelectionReport) {
        self.0.report(report);
        self.1.report(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tee_forwards_to_both() {
        let mut tee = TeeSink(RecordingSink::default(), RecordingSink::default());
        tee.skip(Skip::NoCodec {
            format_id: "sb0".to_string(),
        });
        tee.anomaly(Anomaly::LanguageNotFound {
            language: String::new(),
        });
        assert_eq!(tee.0.skips, tee.1.skips);
        assert_eq!(tee.0.anomalies.len(), 1);
        assert_eq!(tee.1.anomalies.len(), 1);
    }

    #[test]
    fn test_skip_display() {
        let skip = Skip::StreamingProtocol {
            format_id: "233".to_string(),
            protocol: "m3u8_native".to_string(),
        };
        assert_eq!(skip.to_string(), "skip 'm3u8_native' (233)");
    }

    #[test]
    fn test_anomaly_display() {
        let anomaly = Anomaly::LanguageNotFound {
            language: "de".to_string(),
        };
        assert_eq!(anomaly.to_string(), "language 'de' not found");
    }
}
