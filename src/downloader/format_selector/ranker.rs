// Track ranking - best format per codec family
//
// Within a family the highest rounded quality wins, then the highest rounded
// total bitrate. On a full tie the format seen last in the catalog wins.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::catalog::{CodecFamily, FormatDescriptor};

/// Candidates grouped by codec family, then by format id (catalog order)
pub type CandidateSet<'a> = IndexMap<CodecFamily, IndexMap<String, &'a FormatDescriptor>>;

/// Winner of one codec family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackChoice {
    pub format_id: String,
    pub quality: i64,
}

/// Group descriptors by the family of the codec returned by `codec`
pub fn group_by_family<'a, I>(descriptors: I, codec: fn(&FormatDescriptor) -> Option<&str>) -> CandidateSet<'a>
where
    I: IntoIterator<Item = &'a FormatDescriptor>,
{
    let mut set: CandidateSet<'a> = IndexMap::new();
    for descriptor in descriptors {
        let Some(codec) = codec(descriptor) else {
            continue;
        };
        // a repeated id keeps the position of its first occurrence
        set.entry(CodecFamily::from_codec(codec))
            .or_default()
            .insert(descriptor.format_id.clone(), descriptor);
    }
    set
}

/// Pick one winner for every non-empty family
pub fn rank(set: &CandidateSet<'_>) -> IndexMap<CodecFamily, TrackChoice> {
    set.iter()
        .filter_map(|(family, candidates)| {
            best_of(candidates.values().copied()).map(|best| {
                (
                    family.clone(),
                    TrackChoice {
                        format_id: best.format_id.clone(),
                        quality: best.rounded_quality(),
                    },
                )
            })
        })
        .collect()
}

pub fn rank_video(video: &[FormatDescriptor]) -> IndexMap<CodecFamily, TrackChoice> {
    rank(&group_by_family(video, FormatDescriptor::video_codec))
}

pub fn rank_audio(audio: &[&FormatDescriptor]) -> IndexMap<CodecFamily, TrackChoice> {
    rank(&group_by_family(audio.iter().copied(), FormatDescriptor::audio_codec))
}

fn best_of<'a>(candidates: impl Iterator<Item = &'a FormatDescriptor>) -> Option<&'a FormatDescriptor> {
    candidates.fold(None, |best, candidate| match best {
        Some(b) if rank_key(b) > rank_key(candidate) => Some(b),
        _ => Some(candidate),
    })
}

fn rank_key(descriptor: &FormatDescriptor) -> (i64, i64) {
    (descriptor.rounded_quality(), descriptor.rounded_tbr())
}

/// One line of the candidate listing in a report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateRow {
    pub format_id: String,
    pub codec: String,
    pub quality: i64,
    pub tbr: i64,
    pub language_preference: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampling_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
}

impl CandidateRow {
    fn from_descriptor(descriptor: &FormatDescriptor, codec: &str) -> Self {
        let resolution = match (descriptor.width, descriptor.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        };
        Self {
            format_id: descriptor.format_id.clone(),
            codec: codec.to_string(),
            quality: descriptor.rounded_quality(),
            tbr: descriptor.rounded_tbr(),
            language_preference: descriptor.language_preference(),
            resolution,
            fps: descriptor.fps.map(|f| f.round() as i64),
            channels: descriptor.audio_channels,
            sampling_rate: descriptor.asr,
            filesize: descriptor.filesize,
        }
    }
}

impl fmt::Display for CandidateRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {:5} - quality: {:2} - tbr: {:4}",
            self.format_id, self.quality, self.tbr
        )?;
        if let Some(resolution) = &self.resolution {
            write!(f, " - size: {:9}", resolution)?;
        }
        write!(f, " - codec: {} - pref: {}", self.codec, self.language_preference)
    }
}

/// Printable listing of a candidate set
pub fn candidate_rows(
    set: &CandidateSet<'_>,
    codec: fn(&FormatDescriptor) -> Option<&str>,
) -> IndexMap<CodecFamily, Vec<CandidateRow>> {
    set.iter()
        .map(|(family, candidates)| {
            let rows = candidates
                .values()
                .map(|d| CandidateRow::from_descriptor(d, codec(d).unwrap_or_default()))
                .collect();
            (family.clone(), rows)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_video(id: &str, vcodec: &str, quality: f64, tbr: f64) -> FormatDescriptor {
        FormatDescriptor {
            format_id: id.to_string(),
            protocol: "https".to_string(),
            acodec: Some("none".to_string()),
            vcodec: Some(vcodec.to_string()),
            language: None,
            language_preference: None,
            format_note: None,
            tbr: Some(tbr),
            quality: Some(quality),
            width: Some(1920),
            height: Some(1080),
            fps: Some(30.0),
            audio_channels: None,
            asr: None,
            filesize: None,
        }
    }

    #[test]
    fn test_highest_quality_wins() {
        let video = vec![
            make_video("248", "vp9", 9.0, 2500.0),
            make_video("244", "vp9", 7.0, 9000.0),
        ];
        let best = rank_video(&video);
        assert_eq!(best["vp09"].format_id, "248");
        assert_eq!(best["vp09"].quality, 9);
    }

    #[test]
    fn test_bitrate_breaks_quality_tie() {
        let video = vec![
            make_video("399", "av01.0.08M.08", 9.0, 1500.0),
            make_video("699", "av01.0.08M.10", 9.0, 2100.0),
            make_video("400", "av01.0.12M.08", 9.0, 1800.0),
        ];
        let best = rank_video(&video);
        assert_eq!(best["av01"].format_id, "699");
    }

    #[test]
    fn test_full_tie_keeps_last_seen() {
        let video = vec![
            make_video("137", "avc1.640028", 9.0, 4400.4),
            make_video("299", "avc1.64002a", 9.0, 4399.6),
        ];
        let best = rank_video(&video);
        assert_eq!(best["avc1"].format_id, "299");
    }

    #[test]
    fn test_one_winner_per_family_without_cross_family_comparison() {
        let video = vec![
            make_video("160", "avc1.4d400c", 0.0, 100.0),
            make_video("313", "vp9", 11.0, 18000.0),
            make_video("701", "av01.0.12M.10", 11.0, 20000.0),
        ];
        let best = rank_video(&video);

        assert_eq!(best.len(), 3);
        assert_eq!(best["avc1"].format_id, "160");
        let families: Vec<&str> = best.keys().map(|f| f.as_str()).collect();
        assert_eq!(families, vec!["avc1", "vp09", "av01"]);
    }

    #[test]
    fn test_winner_is_maximal_within_family() {
        let video: Vec<FormatDescriptor> = (0..12)
            .map(|i| make_video(&format!("v{}", i), "vp09.00.40.08", ((i * 7) % 5) as f64, 100.0))
            .collect();
        let best = rank_video(&video);
        let winner = &best["vp09"];
        assert!(video.iter().all(|v| v.rounded_quality() <= winner.quality));
    }

    #[test]
    fn test_repeated_id_keeps_first_position() {
        let video = vec![
            make_video("248", "vp9", 9.0, 2500.0),
            make_video("303", "vp9", 9.0, 2500.0),
            make_video("248", "vp9", 9.0, 2500.0),
        ];
        let set = group_by_family(&video, FormatDescriptor::video_codec);
        let ids: Vec<&str> = set["vp09"].keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["248", "303"]);
        assert_eq!(rank(&set)["vp09"].format_id, "303");
    }

    #[test]
    fn test_rank_audio_per_family() {
        let mut opus = make_video("251", "none", 3.0, 130.0);
        opus.acodec = Some("opus".to_string());
        let mut low = make_video("140", "none", 2.0, 129.0);
        low.acodec = Some("mp4a.40.2".to_string());
        let mut high = make_video("141", "none", 3.0, 255.0);
        high.acodec = Some("mp4a.40.2".to_string());

        let best = rank_audio(&[&opus, &low, &high]);
        assert_eq!(best.len(), 2);
        assert_eq!(best["opus"].format_id, "251");
        assert_eq!(best["mp4a"], TrackChoice { format_id: "141".to_string(), quality: 3 });
    }

    #[test]
    fn test_candidate_row_display() {
        let video = make_video("137", "avc1.640028", 9.0, 4400.0);
        let row = CandidateRow::from_descriptor(&video, "avc1.640028");
        assert_eq!(
            row.to_string(),
            "id: 137   - quality:  9 - tbr: 4400 - size: 1920x1080 - codec: avc1.640028 - pref: -1"
        );
    }
}
