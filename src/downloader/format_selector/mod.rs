// FormatSelector - picks the formats to download from a yt-dlp catalog
//
// Pipeline (single call, no shared state):
// validate -> disambiguate ids -> filter/classify -> resolve language -> rank per codec family
//
// Result example:
//   language: "de"
//   video:    { vp09: ("303", 9), avc1: ("299", 9), av01: ("399", 9) }
//   audio:    { opus: ("251-5", 3), mp4a: ("140-5", 3) }
//
// Quality tiers (video): 0 = 144p, 5 = 240p, 6 = 360p, 7 = 480p, 8 = 720p,
// 9 = 1080p, 10 = 1440p, 11 = 2160p. Audio: 2 ~ 64 kbit/s, 3 ~ 128 kbit/s.

pub mod catalog;
pub mod diagnostics;
pub mod disambiguate;
pub mod language;
pub mod ranker;
pub mod report;

pub use catalog::{CodecFamily, FilteredSet, FormatDescriptor, FormatKind, MediaCatalog};
pub use diagnostics::{Anomaly, DiagnosticsSink, RecordingSink, Skip, TeeSink, TracingSink};
pub use disambiguate::Collision;
pub use language::{LanguageResolution, LanguageResolver};
pub use ranker::{CandidateRow, TrackChoice};
pub use report::{FormatRequest, FormatSpec, SelectionError, SelectionReport, SelectionResult};

use indexmap::IndexMap;

use catalog::parse_descriptors;
use ranker::{candidate_rows, group_by_family, rank_audio, rank_video};

/// Run the full selection on one catalog
///
/// `forced_language` is a primary language subtag ("de", "en"); `None` or an
/// empty string resolves the language from the catalog.
pub fn select(
    catalog: &MediaCatalog,
    forced_language: Option<&str>,
    sink: &mut dyn DiagnosticsSink,
) -> SelectionReport {
    let mut descriptors = parse_descriptors(&catalog.formats, sink);
    let collisions = disambiguate::disambiguate(&mut descriptors);
    let filtered = FilteredSet::ingest(descriptors, sink);

    let resolver = LanguageResolver::new(forced_language, filtered.max_language_preference);
    let (resolution, partitions) = resolver.resolve(&filtered.audio, sink);

    let video = rank_video(&filtered.video);

    let mut audio_candidates = IndexMap::new();
    let mut audio = IndexMap::new();
    for (language, formats) in &partitions {
        if resolution.language.as_deref() == Some(language.as_str()) {
            audio = rank_audio(formats);
        }
        let audio_set = group_by_family(formats.iter().copied(), FormatDescriptor::audio_codec);
        audio_candidates.insert(
            language.clone(),
            candidate_rows(&audio_set, FormatDescriptor::audio_codec),
        );
    }

    let language = resolution
        .language
        .or_else(|| resolver.forced().map(str::to_string))
        .unwrap_or_default();

    let report = SelectionReport {
        media_id: catalog.id.clone(),
        result: SelectionResult {
            language,
            video,
            audio,
            skipped_languages: resolution.skipped,
        },
        collisions,
        combined: filtered
            .combined
            .iter()
            .map(|d| d.format_id.clone())
            .collect(),
        video_candidates: candidate_rows(
            &group_by_family(&filtered.video, FormatDescriptor::video_codec),
            FormatDescriptor::video_codec,
        ),
        audio_candidates,
    };

    sink.report(&report);
    report
}
