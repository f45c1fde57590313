// Language resolution - decides which audio language a download uses
//
// Decision order:
// 1. forced language (primary subtag match), everything else is skipped
// 2. otherwise drop audio below the catalog's highest language_preference
// 3. exactly one language left -> done
// 4. a format marked "original" -> its language (the last marked one)
// 5. forced language matching a full tag exactly
// 6. nothing -> "language not found"

use indexmap::IndexMap;
use std::collections::BTreeSet;

use super::catalog::{primary_subtag, FormatDescriptor};
use super::diagnostics::{Anomaly, DiagnosticsSink, Skip};

/// Audio formats that survived language filtering, per language tag
pub type AudioPartitions<'a> = IndexMap<String, Vec<&'a FormatDescriptor>>;

/// Outcome of language resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageResolution {
    /// Chosen language tag, `None` when resolution failed
    pub language: Option<String>,
    /// Languages of every excluded audio format
    pub skipped: BTreeSet<String>,
}

pub struct LanguageResolver<'f> {
    forced: Option<&'f str>,
    max_preference: i64,
}

impl<'f> LanguageResolver<'f> {
    /// An empty forced language means auto-resolution
    pub fn new(forced: Option<&'f str>, max_preference: i64) -> Self {
        Self {
            forced: forced.map(str::trim).filter(|f| !f.is_empty()),
            max_preference,
        }
    }

    pub fn forced(&self) -> Option<&'f str> {
        self.forced
    }

    /// Resolve the language and return the surviving audio per language
    pub fn resolve<'a>(
        &self,
        audio: &'a [FormatDescriptor],
        sink: &mut dyn DiagnosticsSink,
    ) -> (LanguageResolution, AudioPartitions<'a>) {
        let mut partitions: AudioPartitions<'a> = IndexMap::new();
        let mut skipped = BTreeSet::new();
        let mut original = None;

        for descriptor in audio {
            let language = descriptor.language_tag();

            let keep = match self.forced {
                Some(forced) => primary_subtag(language) == forced,
                None => descriptor.language_preference() >= self.max_preference,
            };
            if !keep {
                skipped.insert(language.to_string());
                sink.skip(Skip::Language {
                    format_id: descriptor.format_id.clone(),
                    language: language.to_string(),
                });
                continue;
            }

            if descriptor.is_original() {
                original = Some(language.to_string());
            }
            partitions
                .entry(language.to_string())
                .or_default()
                .push(descriptor);
        }

        let language = self.choose(&partitions, original);
        if language.is_none() {
            sink.anomaly(Anomaly::LanguageNotFound {
                language: self.forced.unwrap_or_default().to_string(),
            });
        }

        (LanguageResolution { language, skipped }, partitions)
    }

    fn choose(&self, partitions: &AudioPartitions<'_>, original: Option<String>) -> Option<String> {
        if partitions.len() == 1 {
            return partitions.keys().next().cloned();
        }
        if original.is_some() {
            return original;
        }
        self.forced
            .filter(|forced| partitions.contains_key(*forced))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::format_selector::diagnostics::RecordingSink;

    fn make_audio(id: &str, language: &str, preference: i64, note: &str) -> FormatDescriptor {
        FormatDescriptor {
            format_id: id.to_string(),
            protocol: "https".to_string(),
            acodec: Some("opus".to_string()),
            vcodec: Some("none".to_string()),
            language: Some(language.to_string()),
            language_preference: Some(preference),
            format_note: Some(note.to_string()),
            tbr: Some(130.0),
            quality: Some(3.0),
            width: None,
            height: None,
            fps: None,
            audio_channels: Some(2),
            asr: Some(48000),
            filesize: None,
        }
    }

    #[test]
    fn test_forced_language_matches_primary_subtag() {
        let audio = vec![
            make_audio("251-0", "de-DE", -1, "German"),
            make_audio("251-1", "en-US", 10, "English original (default)"),
        ];
        let mut sink = RecordingSink::default();
        let (resolution, partitions) = LanguageResolver::new(Some("de"), 10).resolve(&audio, &mut sink);

        assert_eq!(resolution.language.as_deref(), Some("de-DE"));
        assert_eq!(resolution.skipped, BTreeSet::from(["en-US".to_string()]));
        assert_eq!(partitions.len(), 1);
    }

    #[test]
    fn test_forced_language_wins_over_preference() {
        // de has the lower preference but is forced
        let audio = vec![
            make_audio("251-0", "de", -1, ""),
            make_audio("251-1", "en", 10, "original"),
        ];
        let mut sink = RecordingSink::default();
        let (resolution, _) = LanguageResolver::new(Some("de"), 10).resolve(&audio, &mut sink);
        assert_eq!(resolution.language.as_deref(), Some("de"));
    }

    #[test]
    fn test_preference_filter_drops_dubs() {
        let audio = vec![
            make_audio("251-0", "de", -1, ""),
            make_audio("251-1", "en", 10, ""),
            make_audio("251-2", "fr", -1, ""),
        ];
        let mut sink = RecordingSink::default();
        let (resolution, _) = LanguageResolver::new(None, 10).resolve(&audio, &mut sink);

        assert_eq!(resolution.language.as_deref(), Some("en"));
        assert_eq!(
            resolution.skipped,
            BTreeSet::from(["de".to_string(), "fr".to_string()])
        );
        assert_eq!(sink.skips.len(), 2);
    }

    #[test]
    fn test_original_marker_breaks_ties() {
        let audio = vec![
            make_audio("251-0", "de", 5, ""),
            make_audio("251-1", "en", 5, "English original (default), medium"),
        ];
        let mut sink = RecordingSink::default();
        let (resolution, _) = LanguageResolver::new(None, 5).resolve(&audio, &mut sink);
        assert_eq!(resolution.language.as_deref(), Some("en"));
        assert!(resolution.skipped.is_empty());
    }

    #[test]
    fn test_unresolvable_language_is_an_anomaly() {
        let audio = vec![make_audio("251-0", "de", 5, ""), make_audio("251-1", "en", 5, "")];
        let mut sink = RecordingSink::default();
        let (resolution, _) = LanguageResolver::new(None, 5).resolve(&audio, &mut sink);

        assert_eq!(resolution.language, None);
        assert_eq!(
            sink.anomalies,
            vec![Anomaly::LanguageNotFound {
                language: String::new()
            }]
        );
    }

    #[test]
    fn test_forced_absent_language() {
        let audio = vec![make_audio("251", "fr", -1, "")];
        let mut sink = RecordingSink::default();
        let (resolution, partitions) = LanguageResolver::new(Some("de"), -1).resolve(&audio, &mut sink);

        assert_eq!(resolution.language, None);
        assert!(partitions.is_empty());
        assert_eq!(resolution.skipped, BTreeSet::from(["fr".to_string()]));
        assert_eq!(sink.anomalies.len(), 1);
    }

    #[test]
    fn test_blank_forced_language_means_auto() {
        let resolver = LanguageResolver::new(Some("  "), -1);
        assert_eq!(resolver.forced(), None);
    }

    #[test]
    fn test_language_with_survivors_is_still_skipped() {
        let audio = vec![
            make_audio("139", "en", -1, ""),
            make_audio("140", "en", 10, ""),
            make_audio("141", "de", -1, ""),
        ];
        let mut sink = RecordingSink::default();
        let (resolution, partitions) = LanguageResolver::new(None, 10).resolve(&audio, &mut sink);

        assert_eq!(resolution.language.as_deref(), Some("en"));
        assert_eq!(
            resolution.skipped,
            BTreeSet::from(["de".to_string(), "en".to_string()])
        );
        assert_eq!(partitions["en"].len(), 1);
        assert_eq!(partitions["en"][0].format_id, "140");
    }

    #[test]
    fn test_last_original_marker_wins() {
        let audio = vec![
            make_audio("251", "de", 5, "German original"),
            make_audio("252", "en", 5, "English original (default)"),
        ];
        let mut sink = RecordingSink::default();
        let (resolution, _) = LanguageResolver::new(None, 5).resolve(&audio, &mut sink);
        assert_eq!(resolution.language.as_deref(), Some("en"));
    }
}
