// Selection report - final result handed to the download step

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use super::catalog::CodecFamily;
use super::disambiguate::Collision;
use super::ranker::{CandidateRow, TrackChoice};

/// Best format per codec family plus the resolved language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub language: String,
    pub video: IndexMap<CodecFamily, TrackChoice>,
    pub audio: IndexMap<CodecFamily, TrackChoice>,
    pub skipped_languages: BTreeSet<String>,
}

/// Unsatisfiable request; the download must not start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no audio track available for language '{language}'")]
    NoAudio { language: String },

    #[error("no audio codec matching {wanted:?} <-> {available:?}")]
    NoMatchingAudioCodec {
        wanted: Vec<String>,
        available: Vec<String>,
    },

    #[error("no video codec matching {wanted:?} <-> {available:?}")]
    NoMatchingVideoCodec {
        wanted: Vec<String>,
        available: Vec<String>,
    },
}

/// Complete, explainable outcome of one selection call
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    pub media_id: String,
    pub result: SelectionResult,
    /// Format ids that had to be disambiguated
    pub collisions: Vec<Collision>,
    /// Combined audio+video formats left out of ranking
    pub combined: Vec<String>,
    pub video_candidates: IndexMap<CodecFamily, Vec<CandidateRow>>,
    pub audio_candidates: IndexMap<String, IndexMap<CodecFamily, Vec<CandidateRow>>>,
}

impl SelectionReport {
    pub fn result(&self) -> &SelectionResult {
        &self.result
    }

    /// The result, provided at least one audio track was selected
    pub fn require_audio(&self) -> Result<&SelectionResult, SelectionError> {
        if self.result.audio.is_empty() {
            return Err(SelectionError::NoAudio {
                language: self.result.language.clone(),
            });
        }
        Ok(&self.result)
    }

    pub fn into_result(self) -> Result<SelectionResult, SelectionError> {
        self.require_audio()?;
        Ok(self.result)
    }
}

/// Codec families the caller is willing to download, in preference order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest {
    pub audio_codecs: Vec<String>,
    pub video_codecs: Vec<String>,
    pub audio_only: bool,
}

/// yt-dlp format expression built from a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    pub audio: TrackChoice,
    pub video: Option<TrackChoice>,
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.video {
            Some(video) => write!(f, "{}+{}", video.format_id, self.audio.format_id),
            None => write!(f, "{}", self.audio.format_id),
        }
    }
}

impl SelectionResult {
    /// Build the format expression for `request`
    ///
    /// Among the requested families the one with the highest quality wins;
    /// on equal quality the family listed first is kept.
    pub fn format_spec(&self, request: &FormatRequest) -> Result<FormatSpec, SelectionError> {
        if self.audio.is_empty() {
            return Err(SelectionError::NoAudio {
                language: self.language.clone(),
            });
        }

        let audio = pick_preferred(&self.audio, &request.audio_codecs).ok_or_else(|| {
            SelectionError::NoMatchingAudioCodec {
                wanted: request.audio_codecs.clone(),
                available: families(&self.audio),
            }
        })?;

        if request.audio_only {
            return Ok(FormatSpec { audio, video: None });
        }

        let video = pick_preferred(&self.video, &request.video_codecs).ok_or_else(|| {
            SelectionError::NoMatchingVideoCodec {
                wanted: request.video_codecs.clone(),
                available: families(&self.video),
            }
        })?;

        Ok(FormatSpec {
            audio,
            video: Some(video),
        })
    }
}

fn pick_preferred(
    choices: &IndexMap<CodecFamily, TrackChoice>,
    wanted: &[String],
) -> Option<TrackChoice> {
    let mut best: Option<&TrackChoice> = None;
    for codec in wanted {
        if let Some(choice) = choices.get(codec.as_str()) {
            if best.map_or(true, |b| choice.quality > b.quality) {
                best = Some(choice);
            }
        }
    }
    best.cloned()
}

fn families(choices: &IndexMap<CodecFamily, TrackChoice>) -> Vec<String> {
    choices.keys().map(|f| f.to_string()).collect()
}
