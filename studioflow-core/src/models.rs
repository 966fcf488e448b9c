//! Data models for the rough-cut engine.
//!
//! Mirrors the distilled command/marker/segment/plan records this crate
//! operates on end to end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
//  Transcript input contract
// ---------------------------------------------------------------------------

/// A single transcribed word with optional word-level timestamps.
///
/// A word missing `start`/`end` is invisible to marker detection — it is
/// never normalized, matched, or counted as a command token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
}

/// A segment-level transcript cue (as produced by most STT engines alongside
/// the flat word list). Only the flat `words` list on `Transcript` is
/// required for marker detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegmentCue {
    pub id: i64,
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub words: Vec<Word>,
}

/// Word-level transcript JSON, as produced by the external transcription
/// contract (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: String,
    pub duration: Option<f64>,
    #[serde(default)]
    pub words: Vec<Word>,
    #[serde(default)]
    pub segments: Vec<TranscriptSegmentCue>,
    /// File this transcript was produced from, if known. Not part of the
    /// wire contract.
    #[serde(skip)]
    pub source_file: Option<PathBuf>,
}

/// A single parsed SRT cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrtEntry {
    pub index: u32,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
}

// ---------------------------------------------------------------------------
//  ParsedCommands
// ---------------------------------------------------------------------------

/// Score word recognized after `apply`, mapped to a fixed 0..3 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Skip,
    Fair,
    Good,
    Best,
}

impl Quality {
    /// Fixed table: {skip:0, fair:1, good:2, best:3}.
    pub fn level(self) -> u8 {
        match self {
            Quality::Skip => 0,
            Quality::Fair => 1,
            Quality::Good => 2,
            Quality::Best => 3,
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "skip" => Some(Quality::Skip),
            "fair" => Some(Quality::Fair),
            "good" => Some(Quality::Good),
            "best" => Some(Quality::Best),
            _ => None,
        }
    }
}

/// Free-text title preceded by an optional placement keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleType {
    Lower,
    Full,
    Upper,
}

/// The parsed result of one `slate … done` command region.
///
/// `naming` has no field here on purpose: §4.2 documents it as a disabled
/// grammar slot that is consumed but never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedCommands {
    pub mark: bool,
    pub take: Option<i64>,
    pub scene_number: Option<f64>,
    pub scene_name: Option<String>,
    pub step: Option<i64>,
    pub order: Option<i64>,
    pub segment_type: Option<String>,
    pub quality: Option<Quality>,
    pub hook: Option<String>,
    pub title: Option<String>,
    pub title_type: Option<TitleType>,
    pub effect_product: Option<String>,
    pub effect_name: Option<String>,
    pub effect: Option<String>,
    pub transition_product: Option<String>,
    pub transition_name: Option<String>,
    pub transition_generic: Option<String>,
    pub transition: Option<String>,
    pub screen: Option<String>,
    pub cta: Option<String>,
    pub chapter: Option<String>,
    pub broll: Option<String>,
    /// Deprecated. See §4.2 and the Design Notes open question: a lone
    /// `ending` keyword sets this to `Some(false)`, never `Some(true)`.
    pub ending: Option<bool>,
    pub emotion: Option<String>,
    pub energy: Option<String>,
    pub retroactive_actions: Vec<String>,
    pub score: Option<Quality>,
    pub score_level: Option<u8>,
    pub tokens: Vec<String>,
}

impl ParsedCommands {
    /// `scene_number` with the legacy `order` keyword mirrored in when
    /// `scene_number` itself was never set (§3, §4.2).
    pub fn effective_scene_number(&self) -> Option<f64> {
        self.scene_number.or_else(|| self.order.map(|o| o as f64))
    }
}

// ---------------------------------------------------------------------------
//  AudioMarker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerType {
    Start,
    Retroactive,
    Standalone,
    /// Deprecated; kept only so the cut-point calculation's backward
    /// compatible branch (§4.3) has somewhere to land.
    EndDeprecated,
}

/// An immutable record produced by the marker detector.
///
/// Invariants (§3): `timestamp < done_time`, `done_time <= timestamp + 10.0`,
/// `cut_point >= done_time` for Start/Standalone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioMarker {
    pub timestamp: f64,
    pub marker_type: MarkerType,
    pub commands: Vec<String>,
    pub parsed_commands: ParsedCommands,
    pub done_time: f64,
    pub cut_point: f64,
    pub source_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
//  ClipAnalysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilenameMetadata {
    pub is_screen_recording: bool,
    pub step_number: Option<i64>,
    pub topic_tag: Option<String>,
    pub is_hook: bool,
    pub hook_flow_type: Option<String>,
    pub is_cta: bool,
    pub is_mistake: bool,
    pub take_number: Option<i64>,
}

/// Per-clip analysis record. Created during the analysis pass, mutated only
/// by the transcript analyzer and marker detector, read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipAnalysis {
    pub file_path: PathBuf,
    pub duration: f64,
    pub transcript_path: Option<PathBuf>,
    pub transcript_json_path: Option<PathBuf>,
    #[serde(default)]
    pub entries: Vec<SrtEntry>,
    /// Word-level timestamps from the transcript JSON contract (§6), kept
    /// so the marker pipeline can recover segment text and boundary padding
    /// (§4.4) instead of re-deriving them from the coarser SRT entries.
    #[serde(default)]
    pub words: Vec<Word>,
    pub has_speech: bool,

    pub shot_type: Option<String>,
    pub content_type: Option<String>,
    pub quality_score: f64,
    pub audio_level: Option<f64>,
    pub is_shaky: bool,
    pub exposure_rating: Option<String>,

    #[serde(flatten)]
    pub filename_metadata: FilenameMetadata,

    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub best_moments: Vec<Segment>,
    #[serde(default)]
    pub silence_regions: Vec<(f64, f64)>,
    #[serde(default)]
    pub filler_regions: Vec<(f64, f64)>,
    #[serde(default)]
    pub markers: Vec<AudioMarker>,
}

impl ClipAnalysis {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            duration: 0.0,
            transcript_path: None,
            transcript_json_path: None,
            entries: Vec::new(),
            words: Vec::new(),
            has_speech: false,
            shot_type: None,
            content_type: None,
            quality_score: 0.0,
            audio_level: None,
            is_shaky: false,
            exposure_rating: None,
            filename_metadata: FilenameMetadata::default(),
            topics: Vec::new(),
            best_moments: Vec::new(),
            silence_regions: Vec::new(),
            filler_regions: Vec::new(),
            markers: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
//  Segment
// ---------------------------------------------------------------------------

/// Marker-derived metadata attached to a segment by the segment extractor.
/// Not part of the spec's minimal `Segment` field list (§3) but required to
/// carry scene/take/order/step through to the final sort key (§4.4) — this
/// is additive detail grounded in the marker dataclasses, not a contradiction
/// of the spec's `Segment` shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkerInfo {
    pub scene_number: Option<f64>,
    pub scene_name: Option<String>,
    pub take: Option<i64>,
    pub order: Option<i64>,
    pub step: Option<i64>,
    pub emotion: Option<String>,
    pub energy: Option<String>,
    pub hook: Option<String>,
    pub is_quote: bool,
    pub retroactive_actions: Vec<String>,
}

/// A time range on a single clip. Segments never cross files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub source_file: PathBuf,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub speaker: Option<String>,
    pub topic: Option<String>,
    pub score: f64,
    pub segment_type: String,
    #[serde(default)]
    pub marker_info: Option<MarkerInfo>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Sort key for final plan ordering (§4.4, Design Notes open question 2):
    /// `(scene_number or +inf, take or 0, start_time)`, no special-casing.
    pub fn order_key(&self) -> (f64, i64, f64) {
        let mi = self.marker_info.as_ref();
        let scene = mi.and_then(|m| m.scene_number).unwrap_or(f64::INFINITY);
        let take = mi.and_then(|m| m.take).unwrap_or(0);
        (scene, take, self.start_time)
    }
}

/// A removed segment, retained for the parallel removed-footage export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemovedReason {
    TooShort,
    LowScore,
    DurationLimit,
    DuplicateOverlap,
    TruncatedRemainder,
    NotSelectedForNarrative,
}

impl RemovedReason {
    /// The spec's (§3) exact reason vocabulary, as used in removed-footage EDLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RemovedReason::TooShort => "too_short",
            RemovedReason::LowScore => "low_score",
            RemovedReason::DurationLimit => "duration_limit",
            RemovedReason::DuplicateOverlap => "duplicate_overlap",
            RemovedReason::TruncatedRemainder => "truncated_remainder",
            RemovedReason::NotSelectedForNarrative => "not_selected_for_narrative",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedSegment {
    pub segment: Segment,
    pub reason: RemovedReason,
    pub original_score: f64,
}

// ---------------------------------------------------------------------------
//  Transcript analyzer support types
// ---------------------------------------------------------------------------

/// A scored quote. `clip_index` is a non-owning index into the engine's clip
/// list (Design Notes: never a second owning handle to `ClipAnalysis`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub importance: f64,
    pub clip_index: usize,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NaturalEditPoint {
    pub timestamp: f64,
    pub confidence: f64,
}

/// A theme groups quotes (by index into a flat quote list) under a label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub quote_indices: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookCandidate {
    pub text: String,
    pub score: f64,
    pub clip_index: usize,
    pub timestamp: f64,
}

// ---------------------------------------------------------------------------
//  Style & scoring configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutStyle {
    Doc,
    Interview,
    Episode,
    Tutorial,
    Review,
    Unboxing,
    Comparison,
    Setup,
    Explainer,
}

impl CutStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            CutStyle::Doc => "doc",
            CutStyle::Interview => "interview",
            CutStyle::Episode => "episode",
            CutStyle::Tutorial => "tutorial",
            CutStyle::Review => "review",
            CutStyle::Unboxing => "unboxing",
            CutStyle::Comparison => "comparison",
            CutStyle::Setup => "setup",
            CutStyle::Explainer => "explainer",
        }
    }

    /// Parses a style token, case-insensitively. Used by both the CLI and
    /// the background-services rough-cut trigger (§4.8); the trigger's own
    /// `"tutorial" -> Episode` folding is applied by the caller, not here.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "doc" | "documentary" => Some(CutStyle::Doc),
            "interview" => Some(CutStyle::Interview),
            "episode" => Some(CutStyle::Episode),
            "tutorial" => Some(CutStyle::Tutorial),
            "review" => Some(CutStyle::Review),
            "unboxing" => Some(CutStyle::Unboxing),
            "comparison" => Some(CutStyle::Comparison),
            "setup" => Some(CutStyle::Setup),
            "explainer" => Some(CutStyle::Explainer),
            _ => None,
        }
    }
}

/// Static per-style configuration table (§4.6). Values are grounded in the
/// distilled system's `STYLE_STRUCTURES` table.
#[derive(Debug, Clone)]
pub struct StyleProfile {
    pub sections: &'static [&'static str],
    pub pacing: &'static str,
    pub min_segment: f64,
    pub max_segment: f64,
    pub target_ratio: f64,
    pub pre_handle: f64,
    pub post_handle: f64,
    pub merge_gap_threshold: f64,
    pub flags: &'static [&'static str],
}

pub fn style_profile(style: CutStyle) -> StyleProfile {
    match style {
        CutStyle::Doc => StyleProfile {
            sections: &["opening", "context", "main_story", "reflection", "closing"],
            pacing: "slow",
            min_segment: 3.0,
            max_segment: 90.0,
            target_ratio: 0.8,
            pre_handle: 1.0,
            post_handle: 0.5,
            merge_gap_threshold: 2.0,
            flags: &[],
        },
        CutStyle::Interview => StyleProfile {
            sections: &["intro", "q1", "q2", "q3", "highlight", "closing"],
            pacing: "medium",
            min_segment: 3.0,
            max_segment: 45.0,
            target_ratio: 0.5,
            pre_handle: 0.75,
            post_handle: 0.4,
            merge_gap_threshold: 1.0,
            flags: &[],
        },
        CutStyle::Episode => StyleProfile {
            sections: &["hook", "intro", "main_content", "climax", "outro", "cta"],
            pacing: "fast",
            min_segment: 2.0,
            max_segment: 30.0,
            target_ratio: 0.4,
            pre_handle: 0.3,
            post_handle: 0.2,
            merge_gap_threshold: 1.0,
            flags: &[],
        },
        CutStyle::Tutorial => StyleProfile {
            sections: &["hook", "intro", "step_1", "step_2", "step_3", "summary", "cta"],
            pacing: "very_fast",
            min_segment: 1.0,
            max_segment: 20.0,
            target_ratio: 0.3,
            pre_handle: 0.1,
            post_handle: 0.1,
            merge_gap_threshold: 0.5,
            flags: &[
                "mistake_detection",
                "step_detection",
                "screen_recording_aware",
                "hook_optimization",
            ],
        },
        CutStyle::Review => StyleProfile {
            sections: &[
                "hook", "intro", "overview", "features", "pros", "cons", "verdict", "cta",
            ],
            pacing: "medium_fast",
            min_segment: 2.5,
            max_segment: 45.0,
            target_ratio: 0.5,
            pre_handle: 0.4,
            post_handle: 0.3,
            merge_gap_threshold: 1.5,
            flags: &[
                "feature_detection",
                "pros_cons_detection",
                "verdict_optimization",
                "broll_matching",
            ],
        },
        CutStyle::Unboxing => StyleProfile {
            sections: &["hook", "intro", "unboxing", "first_look", "initial_thoughts", "cta"],
            pacing: "fast",
            min_segment: 1.5,
            max_segment: 25.0,
            target_ratio: 0.4,
            pre_handle: 0.2,
            post_handle: 0.2,
            merge_gap_threshold: 1.0,
            flags: &["reveal_detection", "reaction_prioritization", "unboxing_sequence"],
        },
        CutStyle::Comparison => StyleProfile {
            sections: &[
                "hook", "intro", "product_a", "product_b", "side_by_side", "winner", "cta",
            ],
            pacing: "medium",
            min_segment: 3.0,
            max_segment: 60.0,
            target_ratio: 0.6,
            pre_handle: 0.5,
            post_handle: 0.4,
            merge_gap_threshold: 1.5,
            flags: &["comparison_detection", "product_switching", "spec_extraction"],
        },
        CutStyle::Setup => StyleProfile {
            sections: &[
                "hook", "intro", "prerequisites", "step_1", "step_2", "step_3", "verification",
                "troubleshooting", "cta",
            ],
            pacing: "medium",
            min_segment: 2.0,
            max_segment: 30.0,
            target_ratio: 0.5,
            pre_handle: 0.3,
            post_handle: 0.3,
            merge_gap_threshold: 1.0,
            flags: &[
                "step_detection",
                "error_detection",
                "screen_recording_aware",
                "command_extraction",
            ],
        },
        CutStyle::Explainer => StyleProfile {
            sections: &[
                "hook", "intro", "concept_intro", "explanation", "examples", "summary", "cta",
            ],
            pacing: "slow_medium",
            min_segment: 4.0,
            max_segment: 90.0,
            target_ratio: 0.7,
            pre_handle: 0.6,
            post_handle: 0.5,
            merge_gap_threshold: 2.0,
            flags: &["concept_detection", "example_detection", "visual_aid_matching"],
        },
    }
}

/// Scoring thresholds threaded through the engine as one configuration
/// object rather than scattered constants (Design Notes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub segment_threshold: f64,
    pub quote_min_importance: f64,
    pub duplicate_overlap_pct: f64,
    pub merge_gap_threshold_doc: f64,
    pub merge_gap_threshold_episode: f64,
    pub merge_gap_threshold_tutorial: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            segment_threshold: 0.15,
            quote_min_importance: 50.0,
            duplicate_overlap_pct: 0.3,
            merge_gap_threshold_doc: 2.0,
            merge_gap_threshold_episode: 1.0,
            merge_gap_threshold_tutorial: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
//  RoughCutPlan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoughCutPlan {
    pub style: CutStyle,
    pub clips: Vec<ClipAnalysis>,
    pub segments: Vec<Segment>,
    pub total_duration: f64,
    /// Section name -> indices into `segments`, in section-declaration
    /// order (not alphabetical — a `BTreeMap` would reorder sections like
    /// `hook`/`intro`/`main_content` alphabetically and violate the
    /// flattening invariant below). Flattening every section in order must
    /// reproduce `segments` exactly (§3 invariant).
    pub structure: Vec<(String, Vec<usize>)>,
    pub themes: Vec<Theme>,
    pub narrative_arc: BTreeMap<String, String>,
    pub removed_segments: Vec<RemovedSegment>,
}

// ---------------------------------------------------------------------------
//  Background services job model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionJob {
    pub video_file: PathBuf,
    pub project_path: PathBuf,
    pub status: JobStatus,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error: Option<String>,
    pub srt_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoughCutJob {
    pub footage_dir: PathBuf,
    pub project_path: PathBuf,
    pub style: CutStyle,
    pub use_audio_markers: bool,
    pub status: JobStatus,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error: Option<String>,
    pub edl_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
//  Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
#[error("Operation cancelled: {0}")]
pub struct CancelledError(pub String);

#[derive(Debug, thiserror::Error)]
#[error("Unknown cut style: {0}")]
pub struct InvalidStyleError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_levels() {
        assert_eq!(Quality::Skip.level(), 0);
        assert_eq!(Quality::Fair.level(), 1);
        assert_eq!(Quality::Good.level(), 2);
        assert_eq!(Quality::Best.level(), 3);
    }

    #[test]
    fn test_quality_from_word() {
        assert_eq!(Quality::from_word("best"), Some(Quality::Best));
        assert_eq!(Quality::from_word("nonsense"), None);
    }

    #[test]
    fn test_effective_scene_number_prefers_scene_number() {
        let mut parsed = ParsedCommands::default();
        parsed.scene_number = Some(2.0);
        parsed.order = Some(5);
        assert_eq!(parsed.effective_scene_number(), Some(2.0));
    }

    #[test]
    fn test_effective_scene_number_falls_back_to_order() {
        let mut parsed = ParsedCommands::default();
        parsed.order = Some(5);
        assert_eq!(parsed.effective_scene_number(), Some(5.0));
    }

    #[test]
    fn test_segment_order_key_defaults() {
        let seg = Segment {
            source_file: PathBuf::from("a.mov"),
            start_time: 1.0,
            end_time: 2.0,
            text: String::new(),
            speaker: None,
            topic: None,
            score: 0.0,
            segment_type: "content".to_string(),
            marker_info: None,
        };
        assert_eq!(seg.order_key(), (f64::INFINITY, 0, 1.0));
    }

    #[test]
    fn test_style_profile_doc() {
        let p = style_profile(CutStyle::Doc);
        assert_eq!(p.min_segment, 3.0);
        assert_eq!(p.max_segment, 90.0);
        assert_eq!(p.target_ratio, 0.8);
        assert_eq!(p.pre_handle, 1.0);
        assert_eq!(p.post_handle, 0.5);
    }

    #[test]
    fn test_style_profile_tutorial() {
        let p = style_profile(CutStyle::Tutorial);
        assert_eq!(p.min_segment, 1.0);
        assert_eq!(p.max_segment, 20.0);
        assert_eq!(p.target_ratio, 0.3);
        assert!(p.flags.contains(&"mistake_detection"));
    }

    #[test]
    fn test_cut_style_parse_case_insensitive() {
        assert_eq!(CutStyle::parse("DOC"), Some(CutStyle::Doc));
        assert_eq!(CutStyle::parse("documentary"), Some(CutStyle::Doc));
        assert_eq!(CutStyle::parse("bogus"), None);
    }

    #[test]
    fn test_scoring_config_defaults() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.duplicate_overlap_pct, 0.3);
        assert_eq!(cfg.quote_min_importance, 50.0);
    }
}
