// Format catalog - typed view over the raw yt-dlp "formats" array
//
// Handles:
// - Validation of every raw entry (typed anomaly instead of a missing-key fault)
// - Protocol filtering (https only)
// - DRC duplicate removal
// - Classification into audio-only / video-only / combined / ignorable

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::fmt;

use super::diagnostics::{Anomaly, DiagnosticsSink, Skip};

/// Protocols that are expected in a catalog but never selected
pub const STREAMING_PROTOCOLS: [&str; 3] = ["mhtml", "m3u8_native", "http_dash_segments"];

/// Language tag used for formats without a `language` field
pub const UNKNOWN_LANGUAGE: &str = "und";

/// `language_preference` assumed when the field is missing
pub const DEFAULT_LANGUAGE_PREFERENCE: i64 = -1;

/// Catalog document produced by `yt-dlp --dump-json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCatalog {
    /// Media item id (e.g. the 11-char YouTube id)
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    /// Upload time, unix seconds
    #[serde(default)]
    pub timestamp: Option<f64>,
    /// Raw format entries, validated later by [`parse_descriptors`]
    #[serde(default)]
    pub formats: Vec<Value>,
}

impl MediaCatalog {
    /// Build a catalog from an already parsed JSON document
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Channel name with uploader fallback
    pub fn channel_name(&self) -> &str {
        self.channel
            .as_deref()
            .or(self.uploader.as_deref())
            .unwrap_or("unknown")
    }

    pub fn title_or_id(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// One entry of the format catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Format ID (e.g. "251", "140-1")
    pub format_id: String,
    /// Transport protocol (https, m3u8_native, ...)
    pub protocol: String,
    /// Audio codec or "none"
    #[serde(default)]
    pub acodec: Option<String>,
    /// Video codec or "none"
    #[serde(default)]
    pub vcodec: Option<String>,
    /// BCP-47-like tag (e.g. "en-US")
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub language_preference: Option<i64>,
    /// Format note (e.g. "English (United States) original (default), medium")
    #[serde(default)]
    pub format_note: Option<String>,
    /// Total bitrate in kbps
    #[serde(default)]
    pub tbr: Option<f64>,
    /// Quality tier as reported by the extractor
    #[serde(default)]
    pub quality: Option<f64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub audio_channels: Option<u32>,
    /// Audio sampling rate in Hz
    #[serde(default)]
    pub asr: Option<u32>,
    #[serde(default)]
    pub filesize: Option<u64>,
}

/// Media kind of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    AudioOnly,
    VideoOnly,
    /// Audio and video muxed together (low quality, never ranked)
    Combined,
    /// Neither codec set (storyboards, images, unknown)
    Ignorable,
}

impl FormatDescriptor {
    pub fn audio_codec(&self) -> Option<&str> {
        real_codec(self.acodec.as_deref())
    }

    pub fn video_codec(&self) -> Option<&str> {
        real_codec(self.vcodec.as_deref())
    }

    pub fn kind(&self) -> FormatKind {
        match (self.audio_codec(), self.video_codec()) {
            (Some(_), Some(_)) => FormatKind::Combined,
            (Some(_), None) => FormatKind::AudioOnly,
            (None, Some(_)) => FormatKind::VideoOnly,
            (None, None) => FormatKind::Ignorable,
        }
    }

    /// Language tag, [`UNKNOWN_LANGUAGE`] when absent
    pub fn language_tag(&self) -> &str {
        self.language
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(UNKNOWN_LANGUAGE)
    }

    pub fn language_preference(&self) -> i64 {
        self.language_preference
            .unwrap_or(DEFAULT_LANGUAGE_PREFERENCE)
    }

    pub fn note(&self) -> &str {
        self.format_note.as_deref().unwrap_or("")
    }

    pub fn rounded_quality(&self) -> i64 {
        round_metric(self.quality)
    }

    pub fn rounded_tbr(&self) -> i64 {
        round_metric(self.tbr)
    }

    /// Dynamic-range-compressed duplicate of another audio format
    pub fn is_drc(&self) -> bool {
        self.note().contains("DRC")
    }

    /// Marked by the source as the original-language track
    pub fn is_original(&self) -> bool {
        self.note().contains("original")
    }

    pub fn is_https(&self) -> bool {
        self.protocol == "https"
    }
}

fn real_codec(codec: Option<&str>) -> Option<&str> {
    codec.filter(|c| !c.is_empty() && *c != "none")
}

fn round_metric(value: Option<f64>) -> i64 {
    value
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i64)
        .unwrap_or(0)
}

/// Primary subtag of a language tag ("en-US" -> "en")
pub fn primary_subtag(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Codec name without profile/level ("avc1.64001F" -> "avc1")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodecFamily(String);

impl CodecFamily {
    pub fn from_codec(codec: &str) -> Self {
        let head = codec.split('.').next().unwrap_or(codec);
        // "vp9" and "vp09.00.40.08" are the same codec
        let family = if head == "vp9" { "vp09" } else { head };
        Self(family.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CodecFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CodecFamily {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Validate raw entries, reporting the ones that cannot be used
pub fn parse_descriptors(raw: &[Value], sink: &mut dyn DiagnosticsSink) -> Vec<FormatDescriptor> {
    raw.iter()
        .enumerate()
        .filter_map(|(index, entry)| match FormatDescriptor::deserialize(entry) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                sink.anomaly(Anomaly::MalformedDescriptor {
                    index,
                    reason: e.to_string(),
                });
                None
            }
        })
        .collect()
}

/// Filtered, classified view of a catalog
#[derive(Debug, Clone)]
pub struct FilteredSet {
    pub audio: Vec<FormatDescriptor>,
    pub video: Vec<FormatDescriptor>,
    /// Kept for diagnostics only
    pub combined: Vec<FormatDescriptor>,
    /// Highest `language_preference` among all https formats
    pub max_language_preference: i64,
}

impl Default for FilteredSet {
    fn default() -> Self {
        Self {
            audio: Vec::new(),
            video: Vec::new(),
            combined: Vec::new(),
            max_language_preference: DEFAULT_LANGUAGE_PREFERENCE,
        }
    }
}

impl FilteredSet {
    /// Filter and classify descriptors in catalog order
    pub fn ingest(descriptors: Vec<FormatDescriptor>, sink: &mut dyn DiagnosticsSink) -> Self {
        let mut set = Self::default();

        for descriptor in descriptors {
            if descriptor.is_https() {
                set.max_language_preference = set
                    .max_language_preference
                    .max(descriptor.language_preference());
            } else {
                let format_id = descriptor.format_id;
                let protocol = descriptor.protocol;
                if STREAMING_PROTOCOLS.contains(&protocol.as_str()) {
                    sink.skip(Skip::StreamingProtocol { format_id, protocol });
                } else {
                    sink.anomaly(Anomaly::UnexpectedProtocol { format_id, protocol });
                }
                continue;
            }

            if descriptor.is_drc() {
                sink.skip(Skip::DynamicRangeCompressed {
                    format_id: descriptor.format_id,
                });
                continue;
            }

            match descriptor.kind() {
                FormatKind::AudioOnly => set.audio.push(descriptor),
                FormatKind::VideoOnly => set.video.push(descriptor),
                FormatKind::Combined => {
                    sink.skip(Skip::Combined {
                        format_id: descriptor.format_id.clone(),
                    });
                    set.combined.push(descriptor);
                }
                FormatKind::Ignorable => sink.skip(Skip::NoCodec {
                    format_id: descriptor.format_id,
                }),
            }
        }

        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::format_selector::diagnostics::RecordingSink;
    use serde_json::json;

    fn make_format(id: &str, protocol: &str, acodec: &str, vcodec: &str) -> FormatDescriptor {
        FormatDescriptor {
            format_id: id.to_string(),
            protocol: protocol.to_string(),
            acodec: Some(acodec.to_string()),
            vcodec: Some(vcodec.to_string()),
            language: None,
            language_preference: None,
            format_note: None,
            tbr: None,
            quality: None,
            width: None,
            height: None,
            fps: None,
            audio_channels: None,
            asr: None,
            filesize: None,
        }
    }

    #[test]
    fn test_codec_family_truncates_profile() {
        assert_eq!(CodecFamily::from_codec("avc1.64001F").as_str(), "avc1");
        assert_eq!(CodecFamily::from_codec("mp4a.40.2").as_str(), "mp4a");
        assert_eq!(CodecFamily::from_codec("opus").as_str(), "opus");
    }

    #[test]
    fn test_codec_family_merges_vp9_spellings() {
        assert_eq!(CodecFamily::from_codec("vp9"), CodecFamily::from_codec("vp09.00.40.08"));
    }

    #[test]
    fn test_kind_treats_none_and_missing_alike() {
        let mut f = make_format("1", "https", "none", "avc1.4d401f");
        assert_eq!(f.kind(), FormatKind::VideoOnly);
        f.acodec = None;
        assert_eq!(f.kind(), FormatKind::VideoOnly);
        f.vcodec = Some(String::new());
        assert_eq!(f.kind(), FormatKind::Ignorable);
    }

    #[test]
    fn test_rounding_and_defaults() {
        let mut f = make_format("1", "https", "opus", "none");
        f.quality = Some(2.6);
        f.tbr = Some(129.4);
        assert_eq!(f.rounded_quality(), 3);
        assert_eq!(f.rounded_tbr(), 129);
        assert_eq!(f.language_tag(), UNKNOWN_LANGUAGE);
        assert_eq!(f.language_preference(), -1);
    }

    #[test]
    fn test_primary_subtag() {
        assert_eq!(primary_subtag("en-US"), "en");
        assert_eq!(primary_subtag("de"), "de");
    }

    #[test]
    fn test_malformed_entries_become_anomalies() {
        let raw = vec![
            json!({"format_id": "140", "protocol": "https", "acodec": "mp4a.40.2"}),
            json!({"protocol": "https"}),
            json!("not an object"),
        ];
        let mut sink = RecordingSink::default();
        let parsed = parse_descriptors(&raw, &mut sink);

        assert_eq!(parsed.len(), 1);
        assert_eq!(sink.anomalies.len(), 2);
        assert!(matches!(sink.anomalies[0], Anomaly::MalformedDescriptor { index: 1, .. }));
    }

    #[test]
    fn test_ingest_partitions_and_filters() {
        let mut drc = make_format("251-drc", "https", "opus", "none");
        drc.format_note = Some("medium, DRC".to_string());
        let descriptors = vec![
            make_format("sb0", "mhtml", "none", "none"),
            make_format("233", "m3u8_native", "mp4a.40.2", "none"),
            make_format("999", "rtmp", "mp4a.40.2", "none"),
            make_format("18", "https", "mp4a.40.2", "avc1.42001E"),
            make_format("140", "https", "mp4a.40.2", "none"),
            make_format("137", "https", "none", "avc1.640028"),
            make_format("img", "https", "none", "none"),
            drc,
        ];
        let mut sink = RecordingSink::default();
        let set = FilteredSet::ingest(descriptors, &mut sink);

        assert_eq!(set.audio.len(), 1);
        assert_eq!(set.video.len(), 1);
        assert_eq!(set.combined.len(), 1);
        assert_eq!(sink.anomalies.len(), 1);
        assert!(matches!(
            &sink.anomalies[0],
            Anomaly::UnexpectedProtocol { protocol, .. } if protocol == "rtmp"
        ));
        // sb0, 233, 18 (combined), img, 251-drc
        assert_eq!(sink.skips.len(), 5);

        for f in set.audio.iter().chain(set.video.iter()) {
            assert!(matches!(f.kind(), FormatKind::AudioOnly | FormatKind::VideoOnly));
        }
    }

    #[test]
    fn test_max_preference_only_counts_https() {
        let mut hls = make_format("233", "m3u8_native", "mp4a.40.2", "none");
        hls.language_preference = Some(10);
        let mut video = make_format("137", "https", "none", "avc1.640028");
        video.language_preference = Some(5);

        let mut sink = RecordingSink::default();
        let set = FilteredSet::ingest(vec![hls, video], &mut sink);
        assert_eq!(set.max_language_preference, 5);
    }

    #[test]
    fn test_catalog_channel_fallback() {
        let catalog = MediaCatalog::from_value(json!({
            "id": "abcdefghijk",
            "uploader": "Someone",
            "formats": []
        }))
        .unwrap();
        assert_eq!(catalog.channel_name(), "Someone");
        assert_eq!(catalog.title_or_id(), "abcdefghijk");
    }
}
