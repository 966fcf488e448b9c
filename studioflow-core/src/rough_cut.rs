//! Rough-cut engine (§4.6): turns analyzed clips into a [`RoughCutPlan`].
//!
//! This is the module the rest of the crate is built around. Clip analysis
//! (`analyze_clips`) feeds transcripts and filename metadata into per-clip
//! `best_moments`; `create_rough_cut` then dispatches to one of four
//! pipelines (marker-based, smart documentary, style-specific, quality-based)
//! depending on the requested style and whether audio markers are in play.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use crate::markers::detect_markers;
use crate::metadata;
use crate::models::{
    ClipAnalysis, CutStyle, FilenameMetadata, RemovedReason, RemovedSegment, RoughCutPlan,
    ScoringConfig, Segment, SrtEntry, Theme, Transcript,
};
use crate::segments::extract_segments_from_markers;
use crate::transcript_analyzer::TranscriptAnalyzer;

const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "mxf"];
const SILENCE_GAP_THRESHOLD: f64 = 1.0;
const LONG_PAUSE_GAP: f64 = 3.0;
const VERY_LONG_PAUSE_GAP: f64 = 4.0;
const SEGMENT_SCORE_FLOOR: f64 = 0.1;
const EXTEND_LOOKBACK_MAX: f64 = 10.0;
const EXTEND_LOOKFORWARD_MAX: f64 = 5.0;
const MERGE_GAP_FINAL_PASS: f64 = 3.0;

// ---------------------------------------------------------------------------
//  Filename convention parsing (§4.6)
// ---------------------------------------------------------------------------

struct HookFlowPattern {
    flow_type: &'static str,
    re: &'static str,
}

fn hook_flow_patterns() -> &'static [HookFlowPattern] {
    &[
        HookFlowPattern { flow_type: "CH", re: r"(?i)\bHOOK_CH\b|\bCH_HOOK\b|_CH_|^CH_" },
        HookFlowPattern { flow_type: "AH", re: r"(?i)\bHOOK_AH\b|\bAH_HOOK\b|_AH_|^AH_" },
        HookFlowPattern { flow_type: "PSH", re: r"(?i)\bHOOK_PSH\b|\bPSH_HOOK\b|_PSH_|^PSH_" },
        HookFlowPattern { flow_type: "TPH", re: r"(?i)\bHOOK_TPH\b|\bTPH_HOOK\b|_TPH_|^TPH_" },
        HookFlowPattern { flow_type: "COH", re: r"(?i)\bHOOK_COH\b|\bCOH_HOOK\b|_COH_|^COH_" },
        HookFlowPattern { flow_type: "VH", re: r"(?i)\bHOOK_VH\b|\bVH_HOOK\b|_VH_|^VH_" },
        HookFlowPattern { flow_type: "SH", re: r"(?i)\bHOOK_SH\b|\bSH_HOOK\b|_SH_|^SH_" },
        HookFlowPattern { flow_type: "QH", re: r"(?i)\bHOOK_QH\b|\bQH_HOOK\b|_QH_|^QH_" },
        HookFlowPattern { flow_type: "VALUE_PROP", re: r"(?i)\bHOOK_VP\b|\bVP_HOOK\b|_VP_|^VP_|VALUE_PROP" },
        HookFlowPattern { flow_type: "REVEAL", re: r"(?i)\bHOOK_REVEAL\b|_REVEAL_|^REVEAL_" },
        HookFlowPattern { flow_type: "PROMISE", re: r"(?i)\bHOOK_PROMISE\b|_PROMISE_|^PROMISE_" },
    ]
}

/// Parses filename-convention metadata out of a clip's basename (§4.6).
/// Pure function of the name; never touches the filesystem.
pub fn parse_filename_convention(path: &Path) -> FilenameMetadata {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let upper = stem.to_uppercase();
    let lower = stem.to_lowercase();
    let mut meta = FilenameMetadata::default();

    if upper.starts_with("SCREEN_")
        || upper.starts_with("SCR_")
        || lower.contains("screen")
        || lower.contains("recording")
        || lower.contains("capture")
    {
        meta.is_screen_recording = true;
    }

    let step_re = Regex::new(r"STEP(\d+)").unwrap();
    let step_prefix_re = Regex::new(r"^S(\d+)_").unwrap();
    meta.step_number = step_re
        .captures(&upper)
        .or_else(|| step_prefix_re.captures(&upper))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());

    let topic_re = Regex::new(
        r"^(SETUP|CONFIG|DEMO|INTRO|OUTRO|EXPLAIN|TROUBLESHOOT|ADVANCED)_|_(SETUP|CONFIG|DEMO|INTRO|OUTRO|EXPLAIN|TROUBLESHOOT|ADVANCED)_",
    )
    .unwrap();
    meta.topic_tag = topic_re.captures(&upper).map(|c| {
        c.get(1)
            .or_else(|| c.get(2))
            .unwrap()
            .as_str()
            .to_lowercase()
    });

    if upper.starts_with("HOOK_") || upper.starts_with("OPENING_") || lower.contains("hook") {
        meta.is_hook = true;
    }
    for pattern in hook_flow_patterns() {
        if Regex::new(pattern.re).unwrap().is_match(&upper) {
            meta.hook_flow_type = Some(pattern.flow_type.to_string());
            meta.is_hook = true;
            break;
        }
    }

    if upper.starts_with("CTA_") || upper.starts_with("OUTRO_") || lower.contains("cta") {
        meta.is_cta = true;
    }

    if upper.starts_with("MISTAKE_")
        || upper.starts_with("DELETE_")
        || upper.starts_with("RETAKE_")
        || lower.contains("mistake")
        || lower.contains("delete")
    {
        meta.is_mistake = true;
    }

    meta.take_number = parse_take_number(stem, &upper);
    meta
}

fn parse_take_number(stem: &str, upper: &str) -> Option<i64> {
    if let Some(c) = Regex::new(r"\((\d+)\)").unwrap().captures(stem) {
        return c.get(1)?.as_str().parse().ok();
    }
    if let Some(c) = Regex::new(r"_TAKE(\d+)").unwrap().captures(upper) {
        return c.get(1)?.as_str().parse().ok();
    }
    if let Some(m) = Regex::new(r"_TAKEN").unwrap().find(upper) {
        let before = &stem[..m.start()];
        if let Some(last) = before.rsplit('_').next() {
            return last.parse().ok();
        }
    }
    None
}

/// Strips `_normalized`/duplicate-take suffixes to group sibling takes of the
/// same source clip (§4.6 `_get_base_filename`).
pub fn base_filename(path: &Path) -> String {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let no_normalized = Regex::new(r"_?\d*_normalized$").unwrap().replace(stem, "");
    let no_dup = Regex::new(r"\s*\(\d+\)\s*$")
        .unwrap()
        .replace(&no_normalized, "");
    no_dup.to_lowercase()
}

// ---------------------------------------------------------------------------
//  SRT parsing
// ---------------------------------------------------------------------------

/// Parses an SRT file's contents into cues. Malformed blocks are skipped,
/// not fatal (§7).
pub fn parse_srt(content: &str) -> Vec<SrtEntry> {
    let time_re = Regex::new(
        r"(\d{2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[,.](\d{3})",
    )
    .unwrap();

    let mut entries = Vec::new();
    for block in Regex::new(r"\n\n+").unwrap().split(content.trim()) {
        let lines: Vec<&str> = block.trim().lines().collect();
        if lines.len() < 3 {
            continue;
        }
        let Ok(index) = lines[0].trim().parse::<u32>() else {
            continue;
        };
        let Some(caps) = time_re.captures(lines[1]) else {
            continue;
        };
        let get = |i: usize| caps.get(i).unwrap().as_str().parse::<f64>().unwrap();
        let start = get(1) * 3600.0 + get(2) * 60.0 + get(3) + get(4) / 1000.0;
        let end = get(5) * 3600.0 + get(6) * 60.0 + get(7) + get(8) / 1000.0;
        let text = lines[2..].join(" ");
        entries.push(SrtEntry { index, start_time: start, end_time: end, text });
    }
    entries
}

// ---------------------------------------------------------------------------
//  Silence / filler region detection
// ---------------------------------------------------------------------------

pub fn find_silence_regions(entries: &[SrtEntry], total_duration: f64) -> Vec<(f64, f64)> {
    let mut silence = Vec::new();
    if let Some(first) = entries.first() {
        if first.start_time > 1.0 {
            silence.push((0.0, first.start_time));
        }
    }
    for pair in entries.windows(2) {
        let gap_start = pair[0].end_time;
        let gap_end = pair[1].start_time;
        if gap_end - gap_start > SILENCE_GAP_THRESHOLD {
            silence.push((gap_start, gap_end));
        }
    }
    if let Some(last) = entries.last() {
        if last.end_time < total_duration - 1.0 {
            silence.push((last.end_time, total_duration));
        }
    }
    silence
}

const FILLER_PATTERNS: &[&str] = &["um", "uh", "like", "you know", "sort of", "kind of"];

pub fn find_filler_regions(entries: &[SrtEntry]) -> Vec<(f64, f64)> {
    entries
        .iter()
        .filter(|e| {
            let lower = e.text.to_lowercase();
            FILLER_PATTERNS.iter().any(|p| lower.contains(p))
        })
        .map(|e| (e.start_time, e.end_time))
        .collect()
}

// ---------------------------------------------------------------------------
//  Segment scoring and best-moment extraction (§4.6)
// ---------------------------------------------------------------------------

const TOPIC_KEYWORDS: &[&str] = &[
    "welcome", "today we", "let's talk", "introduce", "my name is", "problem", "issue",
    "challenge", "struggle", "difficult", "frustrat", "i remember", "when i was",
    "my experience", "happened to me", "i felt", "research shows", "studies", "expert",
    "according to", "data suggests", "solution", "fix", "solve", "here's how", "the answer",
    "recommend", "in conclusion", "to summarize", "finally", "wrap up", "thanks for watching",
];
const EMOTIONAL_WORDS: &[&str] = &["love", "remember", "miss", "wish", "dream", "hope", "happy", "proud"];

/// Heuristic content score in 0..1 (§4.6 `_score_segment`).
pub fn score_segment(text: &str) -> f64 {
    let mut score = 0.2;
    let lower = text.to_lowercase();

    let word_count = text.split_whitespace().count();
    if (5..=30).contains(&word_count) {
        score += 0.2;
    } else if word_count > 30 {
        score += 0.15;
    } else if word_count >= 3 {
        score += 0.1;
    }

    if TOPIC_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        score += 0.15;
    }
    for word in EMOTIONAL_WORDS {
        if lower.contains(word) {
            score += 0.1;
        }
    }
    if text.contains('?') {
        score += 0.1;
    }

    let filler_count = FILLER_PATTERNS.iter().filter(|p| lower.contains(**p)).count();
    if filler_count > 2 {
        score -= 0.15;
    }

    score.clamp(0.0, 1.0)
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .map(|c| matches!(c, '.' | '!' | '?'))
        .unwrap_or(false)
}

fn starts_sentence(text: &str, gap: f64, prev_ends_sentence: bool) -> bool {
    text.chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false)
        || gap > LONG_PAUSE_GAP
        || prev_ends_sentence
}

/// Finds candidate best moments within a clip, breaking only at sentence
/// boundaries paired with a natural pause (§4.6 `_find_best_moments`). Never
/// cuts mid-sentence.
pub fn find_best_moments(
    file_path: &Path,
    entries: &[SrtEntry],
    analyzer: &TranscriptAnalyzer,
) -> Vec<Segment> {
    if entries.is_empty() {
        return Vec::new();
    }

    let pause_times: Vec<f64> = analyzer
        .natural_edit_points(entries)
        .into_iter()
        .filter(|p| p.confidence > 0.5)
        .map(|p| p.timestamp)
        .collect();

    struct Building {
        start: f64,
        end: f64,
        parts: Vec<String>,
        score: f64,
    }

    let mut moments = Vec::new();
    let mut current: Option<Building> = None;

    for (i, entry) in entries.iter().enumerate() {
        let score = score_segment(&entry.text);
        if score <= SEGMENT_SCORE_FLOOR {
            continue;
        }

        let entry_text = entry.text.trim();
        let prev_ends = i > 0 && ends_sentence(entries[i - 1].text.trim());
        let gap = if i > 0 { entry.start_time - entries[i - 1].end_time } else { 0.0 };
        let starts_new = starts_sentence(entry_text, gap, prev_ends);

        let mut has_pause_before = gap > LONG_PAUSE_GAP;
        if i > 0 && !has_pause_before {
            let prev_end = entries[i - 1].end_time;
            has_pause_before = pause_times.iter().any(|&p| (p - prev_end).abs() < 1.0);
        }

        let should_break = (prev_ends && (has_pause_before || starts_new)) || gap > VERY_LONG_PAUSE_GAP;

        match &mut current {
            None => {
                if starts_new || i == 0 {
                    current = Some(Building {
                        start: entry.start_time,
                        end: entry.end_time,
                        parts: vec![entry.text.clone()],
                        score,
                    });
                }
            }
            Some(building) if should_break => {
                let final_text = building.parts.join(" ");
                if !final_text.trim().is_empty() && !ends_sentence(&final_text) {
                    building.end = entry.end_time;
                    building.parts.push(entry.text.clone());
                }
                moments.push(Segment {
                    source_file: file_path.to_path_buf(),
                    start_time: building.start,
                    end_time: building.end,
                    text: building.parts.join(" "),
                    speaker: None,
                    topic: None,
                    score: building.score,
                    segment_type: "content".to_string(),
                    marker_info: None,
                });
                current = if starts_new {
                    Some(Building {
                        start: entry.start_time,
                        end: entry.end_time,
                        parts: vec![entry.text.clone()],
                        score,
                    })
                } else {
                    Some(Building {
                        start: building.start,
                        end: entry.end_time,
                        parts: {
                            let mut p = building.parts.clone();
                            p.push(entry.text.clone());
                            p
                        },
                        score: building.score.max(score),
                    })
                };
            }
            Some(building) => {
                building.end = entry.end_time;
                building.parts.push(entry.text.clone());
                building.score = building.score.max(score);
            }
        }
    }

    if let Some(building) = current {
        moments.push(Segment {
            source_file: file_path.to_path_buf(),
            start_time: building.start,
            end_time: building.end,
            text: building.parts.join(" "),
            speaker: None,
            topic: None,
            score: building.score,
            segment_type: "content".to_string(),
            marker_info: None,
        });
    }

    let mut moments = merge_adjacent_segments(moments, MERGE_GAP_FINAL_PASS);
    moments.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    moments
}

/// Merges segments on the same file whose gap is within `gap_threshold`
/// (§4.6 `_merge_adjacent_segments`).
pub fn merge_adjacent_segments(segments: Vec<Segment>, gap_threshold: f64) -> Vec<Segment> {
    if segments.is_empty() {
        return Vec::new();
    }
    let mut sorted = segments;
    sorted.sort_by(|a, b| {
        (a.source_file.clone(), a.start_time)
            .partial_cmp(&(b.source_file.clone(), b.start_time))
            .unwrap()
    });

    let mut merged: Vec<Segment> = vec![sorted[0].clone()];
    for seg in sorted.into_iter().skip(1) {
        let last = merged.last_mut().unwrap();
        if seg.source_file == last.source_file && seg.start_time - last.end_time <= gap_threshold {
            last.start_time = last.start_time.min(seg.start_time);
            last.end_time = last.end_time.max(seg.end_time);
            last.text = if seg.text.is_empty() {
                last.text.clone()
            } else {
                format!("{} {}", last.text, seg.text)
            };
            last.score = last.score.max(seg.score);
        } else {
            merged.push(seg);
        }
    }
    merged
}

/// Removes exact duplicates, heavily overlapping segments, and sibling
/// normalized-file duplicates (§4.6 `_deduplicate_segments`).
pub fn deduplicate_segments(segments: Vec<Segment>, overlap_pct: f64) -> Vec<Segment> {
    if segments.is_empty() {
        return Vec::new();
    }
    let mut sorted = segments;
    sorted.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap()
            .then_with(|| a.source_file.cmp(&b.source_file))
            .then_with(|| a.start_time.partial_cmp(&b.start_time).unwrap())
    });

    let mut unique: Vec<Segment> = Vec::new();
    let mut seen_ranges: Vec<(PathBuf, f64, f64)> = Vec::new();

    for seg in sorted {
        let range_key = (seg.source_file.clone(), seg.start_time, seg.end_time);
        if seen_ranges.contains(&range_key) {
            continue;
        }

        let seg_base = base_filename(&seg.source_file);
        let seg_duration = seg.end_time - seg.start_time;
        let mut skip = false;

        for existing in &unique {
            let existing_base = base_filename(&existing.source_file);
            let same_source = seg.source_file == existing.source_file || seg_base == existing_base;
            if !same_source {
                continue;
            }

            let overlap_start = seg.start_time.max(existing.start_time);
            let overlap_end = seg.end_time.min(existing.end_time);
            let overlap = (overlap_end - overlap_start).max(0.0);
            if overlap > 0.0 {
                let existing_duration = existing.end_time - existing.start_time;
                let pct_seg = if seg_duration > 0.0 { overlap / seg_duration } else { 0.0 };
                let pct_existing = if existing_duration > 0.0 { overlap / existing_duration } else { 0.0 };
                if pct_seg > overlap_pct || pct_existing > overlap_pct {
                    skip = true;
                    break;
                }
            }

            if seg_base == existing_base && seg.source_file != existing.source_file {
                let time_diff =
                    (seg.start_time - existing.start_time).abs() + (seg.end_time - existing.end_time).abs();
                if time_diff < 2.0 {
                    let seg_normalized = seg.source_file.to_string_lossy().contains("_normalized");
                    let existing_normalized = existing.source_file.to_string_lossy().contains("_normalized");
                    if seg_normalized && !existing_normalized {
                        skip = true;
                        break;
                    }
                    if !seg_normalized && existing_normalized {
                        skip = true;
                        break;
                    }
                }
                if seg.start_time >= existing.start_time && seg.end_time <= existing.end_time {
                    skip = true;
                    break;
                }
            }

            let gap_before = (seg.start_time - existing.end_time).abs();
            if gap_before < 5.0 && !seg.text.is_empty() && !existing.text.is_empty() {
                let lower_seg = seg.text.to_lowercase();
                let lower_existing = existing.text.to_lowercase();
                let seg_words: std::collections::HashSet<&str> = lower_seg.split_whitespace().collect();
                let existing_words: std::collections::HashSet<&str> = lower_existing.split_whitespace().collect();
                let intersection = seg_words.intersection(&existing_words).count();
                let union = seg_words.union(&existing_words).count();
                if union > 0 && intersection as f64 / union as f64 > 0.5 {
                    skip = true;
                    break;
                }
            }
        }

        if !skip {
            seen_ranges.push(range_key);
            unique.push(seg);
        }
    }

    // Drop any remaining exact subsets of a same-file sibling.
    unique
        .iter()
        .filter(|seg| {
            !unique.iter().any(|other| {
                other != *seg
                    && seg.source_file == other.source_file
                    && seg.start_time >= other.start_time
                    && seg.end_time <= other.end_time
            })
        })
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
//  ClipAnalysis
// ---------------------------------------------------------------------------

/// Recursively walks `footage_dir` for video files, preferring a
/// `_normalized` sibling over its original when both exist, and producing
/// one via the LUFS side effect (§4.6 `analyze_clips`) for a plain file that
/// doesn't have one yet and isn't already within tolerance.
pub fn discover_video_files(footage_dir: &Path) -> Vec<PathBuf> {
    let mut normalized_map: std::collections::HashMap<String, PathBuf> = std::collections::HashMap::new();
    let mut plain_map: std::collections::HashMap<String, PathBuf> = std::collections::HashMap::new();

    for entry in WalkDir::new(footage_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            continue;
        }
        let base = base_filename(path);
        if path.file_stem().and_then(|s| s.to_str()).unwrap_or("").contains("_normalized") {
            normalized_map.entry(base).or_insert_with(|| path.to_path_buf());
        } else {
            plain_map.entry(base).or_insert_with(|| path.to_path_buf());
        }
    }

    // LUFS side effect (§4.6): a plain file with no normalized sibling yet
    // gets produced and preferred, same as a sibling that already existed on
    // disk. Non-fatal: if `ffmpeg` can't measure or normalize, the plain
    // file is analyzed as-is (§7).
    for (base, path) in plain_map.iter() {
        if normalized_map.contains_key(base) {
            continue;
        }
        if metadata::is_normalized(path) {
            continue;
        }
        if let Some(normalized) = metadata::normalize_audio(path) {
            normalized_map.insert(base.clone(), normalized);
        }
    }

    let mut bases: Vec<String> = normalized_map.keys().chain(plain_map.keys()).cloned().collect();
    bases.sort();
    bases.dedup();

    let mut files: Vec<PathBuf> = bases
        .into_iter()
        .filter_map(|base| normalized_map.get(&base).or_else(|| plain_map.get(&base)).cloned())
        .collect();
    files.sort();
    files
}

/// Builds a [`ClipAnalysis`] for one clip, given its sidecar transcript (if
/// any). Duration and speech detection degrade gracefully per §7: a missing
/// transcript yields `has_speech=false`, not an error.
pub fn analyze_clip(
    file_path: PathBuf,
    srt_content: Option<&str>,
    transcript: Option<&Transcript>,
    analyzer: &mut TranscriptAnalyzer,
) -> ClipAnalysis {
    let duration = metadata::probe_duration(&file_path);
    let mut clip = ClipAnalysis::new(file_path.clone());
    clip.duration = duration;
    clip.filename_metadata = parse_filename_convention(&file_path);

    if let Some(content) = srt_content {
        clip.entries = parse_srt(content);
    }
    clip.has_speech = !clip.entries.is_empty();

    if clip.has_speech {
        clip.silence_regions = find_silence_regions(&clip.entries, duration);
        clip.filler_regions = find_filler_regions(&clip.entries);
        clip.best_moments = find_best_moments(&file_path, &clip.entries, analyzer);

        let mut topics = Vec::new();
        for entry in &clip.entries {
            let topic = analyzer.detect_topic(&entry.text).as_str().to_string();
            if !topics.contains(&topic) {
                topics.push(topic);
            }
        }
        clip.topics = topics;
    }

    if let Some(t) = transcript {
        clip.markers = detect_markers(t);
        clip.words = t.words.clone();
    }

    clip
}

// ---------------------------------------------------------------------------
//  RoughCutEngine
// ---------------------------------------------------------------------------

pub struct RoughCutEngine {
    pub clips: Vec<ClipAnalysis>,
    pub analyzer: TranscriptAnalyzer,
    pub scoring_config: ScoringConfig,
    pub themes: Vec<Theme>,
}

impl RoughCutEngine {
    pub fn new(scoring_config: ScoringConfig) -> Self {
        Self {
            clips: Vec::new(),
            analyzer: TranscriptAnalyzer::new(),
            scoring_config,
            themes: Vec::new(),
        }
    }

    /// Creates a rough-cut plan for `style` (§4.6 `create_rough_cut`
    /// dispatch). Returns `Err` only when no clips have been analyzed.
    pub fn create_rough_cut(
        &mut self,
        style: CutStyle,
        target_duration: Option<f64>,
        use_smart_features: bool,
        use_audio_markers: bool,
    ) -> Result<RoughCutPlan, crate::models::InvalidStyleError> {
        if self.clips.is_empty() {
            return Err(crate::models::InvalidStyleError("no clips analyzed".to_string()));
        }

        if use_audio_markers {
            let has_markers = self.clips.iter().any(|c| !c.markers.is_empty());
            if has_markers {
                return Ok(self.create_marker_based_cut(style));
            }
        }

        match style {
            CutStyle::Doc if use_smart_features => Ok(self.create_smart_documentary_cut(target_duration)),
            CutStyle::Review => Ok(self.create_dedicated_cut(
                CutStyle::Review,
                target_duration,
                &["feature", "pros_cons"],
                false,
                1.0,
            )),
            CutStyle::Unboxing => Ok(self.create_dedicated_cut(
                CutStyle::Unboxing,
                target_duration,
                &["reveal"],
                true,
                0.5,
            )),
            CutStyle::Comparison => Ok(self.create_dedicated_cut(
                CutStyle::Comparison,
                target_duration,
                &["comparison"],
                false,
                1.5,
            )),
            CutStyle::Setup => Ok(self.create_dedicated_cut(CutStyle::Setup, target_duration, &[], false, 1.0)),
            CutStyle::Explainer => Ok(self.create_dedicated_cut(
                CutStyle::Explainer,
                target_duration,
                &["concept"],
                false,
                2.0,
            )),
            _ => Ok(self.create_quality_based_cut(style, target_duration)),
        }
    }

    fn create_marker_based_cut(&self, style: CutStyle) -> RoughCutPlan {
        let mut segments: Vec<Segment> = Vec::new();
        for clip in &self.clips {
            if clip.markers.is_empty() {
                continue;
            }
            let transcript = Transcript {
                text: String::new(),
                language: String::new(),
                duration: Some(clip.duration),
                words: clip.words.clone(),
                segments: Vec::new(),
                source_file: Some(clip.file_path.clone()),
            };
            segments.extend(extract_segments_from_markers(
                &clip.markers,
                &transcript,
                clip.file_path.clone(),
                Some(clip.duration),
            ));
        }
        segments.sort_by(|a, b| a.order_key().partial_cmp(&b.order_key()).unwrap());

        let structure = group_by_segment_type(&segments);
        let profile = crate::models::style_profile(style);
        let total_duration = compute_total_duration(&segments, &self.clips, profile.pre_handle, profile.post_handle);

        RoughCutPlan {
            style,
            clips: self.clips.clone(),
            segments,
            total_duration,
            structure,
            themes: Vec::new(),
            narrative_arc: Default::default(),
            removed_segments: Vec::new(),
        }
    }

    /// Shared template for the Review/Unboxing/Comparison/Setup/Explainer
    /// pipelines (§4.6): best moments plus style keyword detectors, deduped,
    /// greedily selected under `target_duration`, merged, organized.
    fn create_dedicated_cut(
        &mut self,
        style: CutStyle,
        target_duration: Option<f64>,
        detectors: &[&str],
        prioritize_first_detector: bool,
        merge_gap: f64,
    ) -> RoughCutPlan {
        let profile = crate::models::style_profile(style);
        let mut all_segments: Vec<Segment> = Vec::new();

        for clip in self.clips.clone() {
            all_segments.extend(clip.best_moments.clone());
            for kind in detectors {
                let detected = match *kind {
                    "feature" => self.analyzer.detect_features(&clip.entries, &clip.file_path),
                    "pros_cons" => self.analyzer.detect_pros_cons(&clip.entries, &clip.file_path),
                    "reveal" => self.analyzer.detect_reveals(&clip.entries, &clip.file_path),
                    "comparison" => self.analyzer.detect_comparisons(&clip.entries, &clip.file_path),
                    "concept" => self.analyzer.detect_concepts(&clip.entries, &clip.file_path),
                    _ => Vec::new(),
                };
                all_segments.extend(detected);
            }
        }

        all_segments = deduplicate_segments(all_segments, self.scoring_config.duplicate_overlap_pct);
        if prioritize_first_detector {
            let lead = detectors.first().copied().unwrap_or("");
            all_segments.sort_by(|a, b| {
                (b.segment_type == lead, b.score)
                    .partial_cmp(&(a.segment_type == lead, a.score))
                    .unwrap()
            });
        } else {
            all_segments.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        }

        let total_raw: f64 = self.clips.iter().map(|c| c.duration).sum();
        let target_duration = target_duration.unwrap_or(total_raw * profile.target_ratio);

        let mut selected = Vec::new();
        let mut removed = Vec::new();
        let mut current_duration = 0.0;

        for seg in all_segments {
            let seg_duration = seg.duration() + profile.pre_handle + profile.post_handle;
            if current_duration + seg_duration <= target_duration {
                current_duration += seg_duration;
                selected.push(seg);
            } else {
                removed.push(RemovedSegment {
                    original_score: seg.score,
                    segment: seg,
                    reason: RemovedReason::DurationLimit,
                });
            }
        }

        let selected = merge_adjacent_segments(selected, merge_gap);
        let structure = organize_by_structure(selected.clone(), style);
        let ordered_segments = flatten_structure(&structure, &selected);

        RoughCutPlan {
            style,
            clips: self.clips.clone(),
            total_duration: compute_total_duration(&ordered_segments, &self.clips, profile.pre_handle, profile.post_handle),
            segments: ordered_segments,
            structure,
            themes: Vec::new(),
            narrative_arc: Default::default(),
            removed_segments: removed,
        }
    }

    /// The Interview/Episode/Tutorial fallback pipeline and the default for
    /// any style reached without `use_smart_features` (§4.6
    /// `_create_quality_based_cut`).
    fn create_quality_based_cut(&mut self, style: CutStyle, target_duration: Option<f64>) -> RoughCutPlan {
        let profile = crate::models::style_profile(style);

        let mut all_segments: Vec<Segment> =
            self.clips.iter().flat_map(|c| c.best_moments.clone()).collect();
        all_segments = deduplicate_segments(all_segments, self.scoring_config.duplicate_overlap_pct);
        all_segments.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());

        let total_raw: f64 = self.clips.iter().map(|c| c.duration).sum();
        let target_duration = target_duration.unwrap_or(total_raw * profile.target_ratio);

        let extended_segments: Vec<Segment> = all_segments
            .into_iter()
            .map(|seg| extend_to_sentence_boundary(seg, &self.clips))
            .collect();

        let mut selected = Vec::new();
        let mut removed = Vec::new();
        let mut current_duration = 0.0;

        for seg in extended_segments {
            let raw_duration = seg.duration();

            if raw_duration < profile.min_segment {
                removed.push(RemovedSegment { original_score: seg.score, segment: seg, reason: RemovedReason::TooShort });
                continue;
            }
            if seg.score < self.scoring_config.segment_threshold {
                removed.push(RemovedSegment { original_score: seg.score, segment: seg, reason: RemovedReason::LowScore });
                continue;
            }

            let seg = if raw_duration > profile.max_segment {
                let truncated_end = seg.start_time + profile.max_segment;
                let remainder = Segment {
                    source_file: seg.source_file.clone(),
                    start_time: truncated_end,
                    end_time: seg.end_time,
                    text: String::new(),
                    speaker: None,
                    topic: seg.topic.clone(),
                    score: seg.score * 0.8,
                    segment_type: seg.segment_type.clone(),
                    marker_info: None,
                };
                removed.push(RemovedSegment {
                    original_score: remainder.score,
                    segment: remainder,
                    reason: RemovedReason::TruncatedRemainder,
                });
                Segment { end_time: truncated_end, ..seg }
            } else {
                seg
            };

            let is_duplicate = selected.iter().any(|existing: &Segment| {
                if existing.source_file != seg.source_file {
                    return false;
                }
                let overlap_start = seg.start_time.max(existing.start_time);
                let overlap_end = seg.end_time.min(existing.end_time);
                let overlap = (overlap_end - overlap_start).max(0.0);
                if overlap <= 0.0 {
                    return false;
                }
                let shorter = seg.duration().min(existing.duration());
                shorter > 0.0 && overlap / shorter > self.scoring_config.duplicate_overlap_pct
            });
            if is_duplicate {
                removed.push(RemovedSegment { original_score: seg.score, segment: seg, reason: RemovedReason::DuplicateOverlap });
                continue;
            }

            let seg_duration_with_handles = seg.duration() + profile.pre_handle + profile.post_handle;
            if current_duration + seg_duration_with_handles <= target_duration {
                current_duration += seg_duration_with_handles;
                selected.push(seg);
            } else if seg.score > 0.7 {
                current_duration += seg_duration_with_handles;
                selected.push(seg);
            } else if seg.score > 0.6 && current_duration + seg_duration_with_handles <= target_duration * 1.1 {
                current_duration += seg_duration_with_handles;
                selected.push(seg);
            } else {
                removed.push(RemovedSegment { original_score: seg.score, segment: seg, reason: RemovedReason::DurationLimit });
            }
        }

        let structure = organize_by_structure(selected.clone(), style);
        let ordered_segments = flatten_structure(&structure, &selected);

        RoughCutPlan {
            style,
            clips: self.clips.clone(),
            total_duration: compute_total_duration(&ordered_segments, &self.clips, profile.pre_handle, profile.post_handle),
            segments: ordered_segments,
            structure,
            themes: Vec::new(),
            narrative_arc: Default::default(),
            removed_segments: removed,
        }
    }

    /// Narrative-arc documentary pipeline (§4.6
    /// `_create_smart_documentary_cut`), condensed: groups quotes into
    /// topic-ordered themes, builds a named narrative arc from them, and
    /// falls through the same dedup/merge pass as the other pipelines.
    fn create_smart_documentary_cut(&mut self, _target_duration: Option<f64>) -> RoughCutPlan {
        let profile = crate::models::style_profile(CutStyle::Doc);
        const THEME_ORDER: &[&str] = &[
            "introduction", "problem", "personal_stories", "expert_opinions", "solutions", "conclusion",
        ];

        let mut topic_quotes: std::collections::HashMap<String, Vec<Segment>> = std::collections::HashMap::new();
        for clip in &self.clips {
            if !clip.has_speech {
                continue;
            }
            for entry in &clip.entries {
                let importance = self.analyzer.quote_importance(&entry.text);
                if importance < self.scoring_config.quote_min_importance {
                    continue;
                }
                let topic = self.analyzer.detect_topic(&entry.text).as_str().to_string();
                topic_quotes.entry(topic).or_default().push(Segment {
                    source_file: clip.file_path.clone(),
                    start_time: entry.start_time,
                    end_time: entry.end_time,
                    text: entry.text.clone(),
                    speaker: None,
                    topic: None,
                    score: importance / 100.0,
                    segment_type: "quote".to_string(),
                    marker_info: None,
                });
            }
        }

        let mut themes = Vec::new();
        let mut ordered_segments: Vec<Segment> = Vec::new();
        let mut removed_segments: Vec<RemovedSegment> = Vec::new();
        let mut present: Vec<&str> = THEME_ORDER.iter().filter(|t| topic_quotes.contains_key(**t)).copied().collect();
        present.sort_by_key(|t| THEME_ORDER.iter().position(|x| x == t).unwrap());

        for topic in present {
            let mut quotes = topic_quotes.remove(topic).unwrap();
            if quotes.len() < 2 {
                removed_segments.extend(quotes.into_iter().map(|segment| RemovedSegment {
                    original_score: segment.score,
                    segment,
                    reason: RemovedReason::NotSelectedForNarrative,
                }));
                continue;
            }
            quotes.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            let start_idx = ordered_segments.len();
            let keep = if quotes.len() >= 15 { 15 } else { quotes.len() };
            let overflow = quotes.split_off(keep);
            ordered_segments.extend(quotes);
            removed_segments.extend(overflow.into_iter().map(|segment| RemovedSegment {
                original_score: segment.score,
                segment,
                reason: RemovedReason::NotSelectedForNarrative,
            }));
            let indices: Vec<usize> = (start_idx..ordered_segments.len()).collect();
            themes.push(Theme { name: topic.to_string(), quote_indices: indices });
        }

        ordered_segments = deduplicate_segments(ordered_segments, self.scoring_config.duplicate_overlap_pct);
        ordered_segments = merge_adjacent_segments(
            ordered_segments,
            self.scoring_config.merge_gap_threshold_doc,
        );

        let mut narrative_arc = std::collections::BTreeMap::new();
        for theme in &themes {
            narrative_arc.insert(
                theme.name.clone(),
                format!("{} quotes about {}", theme.quote_indices.len(), theme.name),
            );
        }

        let structure: Vec<(String, Vec<usize>)> = vec![("main_story".to_string(), (0..ordered_segments.len()).collect())];
        self.themes = themes.clone();

        RoughCutPlan {
            style: CutStyle::Doc,
            clips: self.clips.clone(),
            total_duration: compute_total_duration(&ordered_segments, &self.clips, profile.pre_handle, profile.post_handle),
            segments: ordered_segments,
            structure,
            themes,
            narrative_arc,
            removed_segments,
        }
    }
}

/// Plan-level total duration (§8 invariant 5): each segment's duration plus
/// its style's handles, clamped to the parent clip's duration.
fn compute_total_duration(
    segments: &[Segment],
    clips: &[ClipAnalysis],
    pre_handle: f64,
    post_handle: f64,
) -> f64 {
    segments
        .iter()
        .map(|seg| {
            let widened = seg.duration() + pre_handle + post_handle;
            match clips.iter().find(|c| c.file_path == seg.source_file) {
                Some(clip) if clip.duration > 0.0 => widened.min(clip.duration),
                _ => widened,
            }
        })
        .sum()
}

fn group_by_segment_type(segments: &[Segment]) -> Vec<(String, Vec<usize>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<usize>> = std::collections::HashMap::new();
    for (idx, seg) in segments.iter().enumerate() {
        let section = if seg.segment_type.is_empty() { "content".to_string() } else { seg.segment_type.clone() };
        if !groups.contains_key(&section) {
            order.push(section.clone());
        }
        groups.entry(section).or_default().push(idx);
    }
    order.into_iter().map(|k| { let v = groups.remove(&k).unwrap(); (k, v) }).collect()
}

fn extend_to_sentence_boundary(seg: Segment, clips: &[ClipAnalysis]) -> Segment {
    let Some(clip) = clips.iter().find(|c| c.file_path == seg.source_file) else {
        return seg;
    };
    if clip.entries.is_empty() || seg.text.is_empty() {
        return seg;
    }

    let overlapping: Vec<usize> = clip
        .entries
        .iter()
        .enumerate()
        .filter(|(_, e)| !(e.end_time <= seg.start_time || e.start_time >= seg.end_time))
        .map(|(i, _)| i)
        .collect();
    let Some(&first_idx) = overlapping.first() else {
        return seg;
    };
    let &last_idx = overlapping.last().unwrap();

    let mut actual_start = clip.entries[first_idx].start_time;
    let seg_text = seg.text.trim();
    let starts_mid = !seg_text.is_empty()
        && !seg_text.starts_with(|c: char| c.is_uppercase() || c == '"' || c.is_ascii_digit());
    let first_text = clip.entries[first_idx].text.trim();
    let first_starts_mid = !first_text.is_empty() && !first_text.starts_with(|c: char| c.is_uppercase() || c == '"');

    if (starts_mid || first_starts_mid) && first_idx > 0 {
        let mut found = false;
        for j in (0..first_idx).rev() {
            let prev_text = clip.entries[j].text.trim();
            if ends_sentence(prev_text) {
                actual_start = clip.entries[first_idx].start_time;
                found = true;
                break;
            }
            actual_start = clip.entries[j].start_time;
            if clip.entries[first_idx].start_time - actual_start > EXTEND_LOOKBACK_MAX {
                actual_start = clip.entries[first_idx].start_time;
                break;
            }
            if j == 0 && actual_start < 0.5 {
                actual_start = (clip.entries[first_idx].start_time - 0.5).max(0.0);
            }
        }
        if !found && actual_start <= clip.entries[first_idx].start_time && (first_idx == 0 || actual_start < 1.0) {
            actual_start = (clip.entries[first_idx].start_time - 1.0).max(0.0);
        }
    }

    let mut actual_end = clip.entries[last_idx].end_time;
    let ends_mid = !seg_text.is_empty() && !ends_sentence(seg_text);
    if ends_mid && last_idx < clip.entries.len() - 1 {
        for j in (last_idx + 1)..clip.entries.len().min(last_idx + 6) {
            let next_text = clip.entries[j].text.trim();
            actual_end = clip.entries[j].end_time;
            if ends_sentence(next_text) {
                break;
            }
            if actual_end - clip.entries[last_idx].end_time > EXTEND_LOOKFORWARD_MAX {
                actual_end = clip.entries[last_idx].end_time;
                break;
            }
        }
    }

    Segment { start_time: actual_start, end_time: actual_end, ..seg }
}

/// Organizes selected segments into style sections (§4.6
/// `_organize_by_structure`). DOC/INTERVIEW/EPISODE use the distilled
/// system's bespoke slicing (recast here as a true partition, since the
/// plan's flattening invariant requires every segment to appear exactly
/// once); every other style falls back to a deterministic, chronologically
/// ordered even split across its sections.
fn organize_by_structure(mut segments: Vec<Segment>, style: CutStyle) -> Vec<(String, Vec<usize>)> {
    let profile = crate::models::style_profile(style);
    if segments.is_empty() {
        return profile.sections.iter().map(|s| (s.to_string(), Vec::new())).collect();
    }

    match style {
        CutStyle::Doc => {
            segments.sort_by(|a, b| (&a.source_file, a.start_time).partial_cmp(&(&b.source_file, b.start_time)).unwrap());
            partition_slices(
                &segments,
                style,
                &[("opening", 1, 0), ("context", 0, 0), ("main_story", 0, 0), ("reflection", 0, 0), ("closing", 0, 1)],
            )
        }
        CutStyle::Episode => {
            segments.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            partition_slices(
                &segments,
                style,
                &[("hook", 1, 0), ("intro", 1, 0), ("main_content", 0, 0), ("climax", 0, 0), ("outro", 0, 1), ("cta", 0, 0)],
            )
        }
        CutStyle::Interview => {
            segments.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            let n = segments.len();
            if n < 6 {
                return vec![("highlight".to_string(), (0..n).collect())];
            }
            // intro + highlight take the top two scorers; the rest split into
            // thirds for q1/q2/q3, and the lowest scorer closes. This is a
            // true partition of `segments`, unlike the overlapping groups the
            // distilled structure produced.
            let q_len = n - 3;
            let third = q_len / 3;
            vec![
                ("intro".to_string(), vec![0]),
                ("q1".to_string(), (2..2 + third).collect()),
                ("q2".to_string(), (2 + third..2 + 2 * third).collect()),
                ("q3".to_string(), (2 + 2 * third..n - 1).collect()),
                ("highlight".to_string(), vec![1]),
                ("closing".to_string(), vec![n - 1]),
            ]
        }
        _ => even_distribution(&segments, profile.sections),
    }
}

/// Builds a section->indices partition from (section, head_count,
/// tail_count) triples: `head_count`/`tail_count` pin the fixed-size parts
/// (e.g. DOC's single-segment opening/closing); sections with `0, 0` share
/// the remaining middle range evenly in declaration order.
fn partition_slices(
    segments: &[Segment],
    _style: CutStyle,
    spec: &[(&str, usize, usize)],
) -> Vec<(String, Vec<usize>)> {
    let n = segments.len();
    if n < 5 {
        let name = spec.iter().find(|(_, h, t)| *h == 0 && *t == 0).map(|(s, _, _)| *s).unwrap_or(spec[0].0);
        return spec
            .iter()
            .map(|(s, _, _)| (s.to_string(), if *s == name { (0..n).collect() } else { Vec::new() }))
            .collect();
    }

    let mut cursor = 0usize;
    let mut result = Vec::new();
    let middle_sections: Vec<usize> = spec
        .iter()
        .enumerate()
        .filter(|(_, (_, h, t))| *h == 0 && *t == 0)
        .map(|(i, _)| i)
        .collect();

    // First pass: fixed head sections consume from the front in order.
    let mut remaining_end = n;
    let mut fixed: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
    for (i, (_, head, tail)) in spec.iter().enumerate() {
        if *head > 0 {
            let take = (*head).min(remaining_end - cursor);
            fixed.insert(i, (cursor..cursor + take).collect());
            cursor += take;
        }
        if *tail > 0 {
            let take = (*tail).min(remaining_end - cursor);
            remaining_end -= take;
        }
    }
    let middle_len = remaining_end.saturating_sub(cursor);
    let per = if middle_sections.is_empty() { 0 } else { (middle_len / middle_sections.len()).max(0) };
    let mut middle_cursor = cursor;
    let mut middle_assign: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
    for (mi, &i) in middle_sections.iter().enumerate() {
        let end = if mi == middle_sections.len() - 1 { remaining_end } else { (middle_cursor + per).min(remaining_end) };
        middle_assign.insert(i, (middle_cursor..end).collect());
        middle_cursor = end;
    }
    // Tail sections consume from the back, in declaration order of their
    // appearance (reversed so the closest-to-end one gets the final slice).
    let mut tail_cursor = remaining_end;
    let mut tail_assign: std::collections::HashMap<usize, Vec<usize>> = std::collections::HashMap::new();
    for (i, (_, _, tail)) in spec.iter().enumerate().rev() {
        if *tail > 0 {
            let start = tail_cursor;
            tail_cursor = (tail_cursor + *tail).min(n);
            tail_assign.insert(i, (start..tail_cursor).collect());
        }
    }

    for (i, (name, _, _)) in spec.iter().enumerate() {
        let indices = fixed
            .remove(&i)
            .or_else(|| middle_assign.remove(&i))
            .or_else(|| tail_assign.remove(&i))
            .unwrap_or_default();
        result.push((name.to_string(), indices));
    }
    result
}

fn even_distribution(segments: &[Segment], sections: &'static [&'static str]) -> Vec<(String, Vec<usize>)> {
    let mut sorted_idx: Vec<usize> = (0..segments.len()).collect();
    sorted_idx.sort_by(|&a, &b| {
        (&segments[a].source_file, segments[a].start_time)
            .partial_cmp(&(&segments[b].source_file, segments[b].start_time))
            .unwrap()
    });

    let n = sorted_idx.len();
    let per = (n / sections.len()).max(1);
    let mut result = Vec::new();
    let mut cursor = 0;
    for (i, section) in sections.iter().enumerate() {
        let end = if i == sections.len() - 1 { n } else { (cursor + per).min(n) };
        result.push((section.to_string(), sorted_idx[cursor..end].to_vec()));
        cursor = end;
    }
    result
}

fn flatten_structure(structure: &[(String, Vec<usize>)], segments: &[Segment]) -> Vec<Segment> {
    structure
        .iter()
        .flat_map(|(_, indices)| indices.iter().map(|&i| segments[i].clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_video_files_prefers_existing_normalized_sibling() {
        let dir = std::env::temp_dir().join(format!("studioflow_test_discover_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("clip.mov"), b"fake").unwrap();
        std::fs::write(dir.join("clip_normalized.mov"), b"fake").unwrap();

        let files = discover_video_files(&dir);
        assert_eq!(files, vec![dir.join("clip_normalized.mov")]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_parse_filename_convention_screen_and_step() {
        let meta = parse_filename_convention(Path::new("SCREEN_STEP3_demo.mov"));
        assert!(meta.is_screen_recording);
        assert_eq!(meta.step_number, Some(3));
    }

    #[test]
    fn test_parse_filename_convention_hook_flow_type() {
        let meta = parse_filename_convention(Path::new("HOOK_CH_opening.mov"));
        assert!(meta.is_hook);
        assert_eq!(meta.hook_flow_type, Some("CH".to_string()));
    }

    #[test]
    fn test_parse_filename_convention_take_in_parens() {
        let meta = parse_filename_convention(Path::new("interview (2).mov"));
        assert_eq!(meta.take_number, Some(2));
    }

    #[test]
    fn test_base_filename_strips_normalized_and_takes() {
        assert_eq!(base_filename(Path::new("clip_normalized.mov")), "clip");
        assert_eq!(base_filename(Path::new("clip (2).mov")), "clip");
    }

    #[test]
    fn test_parse_srt_basic() {
        let content = "1\n00:00:01,000 --> 00:00:04,000\nHello there.\n\n2\n00:00:05,500 --> 00:00:07,000\nSecond line.\n";
        let entries = parse_srt(content);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].start_time, 1.0);
        assert_eq!(entries[1].end_time, 7.0);
    }

    #[test]
    fn test_find_silence_regions() {
        let entries = vec![
            SrtEntry { index: 1, start_time: 2.0, end_time: 3.0, text: "a".into() },
            SrtEntry { index: 2, start_time: 6.0, end_time: 7.0, text: "b".into() },
        ];
        let silence = find_silence_regions(&entries, 10.0);
        assert_eq!(silence, vec![(0.0, 2.0), (3.0, 6.0), (7.0, 10.0)]);
    }

    #[test]
    fn test_score_segment_question_bonus() {
        let score = score_segment("did that really happen?");
        assert!(score >= 0.3);
    }

    #[test]
    fn test_merge_adjacent_segments_merges_close_gap() {
        let segs = vec![
            Segment { source_file: PathBuf::from("a.mov"), start_time: 0.0, end_time: 2.0, text: "one".into(), speaker: None, topic: None, score: 0.5, segment_type: "content".into(), marker_info: None },
            Segment { source_file: PathBuf::from("a.mov"), start_time: 2.5, end_time: 4.0, text: "two".into(), speaker: None, topic: None, score: 0.8, segment_type: "content".into(), marker_info: None },
        ];
        let merged = merge_adjacent_segments(segs, 1.0);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end_time, 4.0);
        assert_eq!(merged[0].score, 0.8);
    }

    #[test]
    fn test_deduplicate_segments_drops_heavy_overlap() {
        let segs = vec![
            Segment { source_file: PathBuf::from("a.mov"), start_time: 0.0, end_time: 10.0, text: "x".into(), speaker: None, topic: None, score: 0.9, segment_type: "content".into(), marker_info: None },
            Segment { source_file: PathBuf::from("a.mov"), start_time: 1.0, end_time: 9.0, text: "y".into(), speaker: None, topic: None, score: 0.5, segment_type: "content".into(), marker_info: None },
        ];
        let deduped = deduplicate_segments(segs, 0.3);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].score, 0.9);
    }

    #[test]
    fn test_organize_by_structure_doc_is_a_partition() {
        let segments: Vec<Segment> = (0..8)
            .map(|i| Segment {
                source_file: PathBuf::from("a.mov"),
                start_time: i as f64,
                end_time: i as f64 + 1.0,
                text: String::new(),
                speaker: None,
                topic: None,
                score: 0.5,
                segment_type: "content".into(),
                marker_info: None,
            })
            .collect();
        let structure = organize_by_structure(segments.clone(), CutStyle::Doc);
        let mut all_indices: Vec<usize> = structure.iter().flat_map(|(_, idx)| idx.clone()).collect();
        all_indices.sort();
        assert_eq!(all_indices, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_organize_by_structure_interview_is_a_partition() {
        let segments: Vec<Segment> = (0..9)
            .map(|i| Segment {
                source_file: PathBuf::from("a.mov"),
                start_time: i as f64,
                end_time: i as f64 + 1.0,
                text: String::new(),
                speaker: None,
                topic: None,
                score: i as f64 / 10.0,
                segment_type: "content".into(),
                marker_info: None,
            })
            .collect();
        let structure = organize_by_structure(segments, CutStyle::Interview);
        let mut all_indices: Vec<usize> = structure.iter().flat_map(|(_, idx)| idx.clone()).collect();
        all_indices.sort();
        assert_eq!(all_indices, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_smart_documentary_cut_tracks_discarded_quotes() {
        let mut clip = ClipAnalysis::new(PathBuf::from("interview.mov"));
        clip.has_speech = true;
        clip.duration = 400.0;

        // A single-quote topic (introduction) never reaches the 2-quote
        // minimum and must be recorded as removed, not silently dropped.
        clip.entries.push(SrtEntry {
            index: 1,
            start_time: 0.0,
            end_time: 3.0,
            text: "welcome everyone to today's episode".to_string(),
        });

        // A 16-quote topic (problem) exceeds the per-theme cap of 15; the
        // lowest-scoring overflow quote must land in removed_segments too.
        for i in 0..16 {
            clip.entries.push(SrtEntry {
                index: 2 + i,
                start_time: 10.0 + i as f64 * 5.0,
                end_time: 12.0 + i as f64 * 5.0,
                text: format!("this problem number {i} is a real struggle for many people"),
            });
        }

        let mut scoring_config = ScoringConfig::default();
        scoring_config.quote_min_importance = 0.0;
        let mut engine = RoughCutEngine::new(scoring_config);
        engine.clips.push(clip);

        let plan = engine
            .create_rough_cut(CutStyle::Doc, None, true, false)
            .unwrap();

        assert!(plan.segments.len() <= 15);
        assert!(plan
            .removed_segments
            .iter()
            .all(|r| r.reason == RemovedReason::NotSelectedForNarrative));
        assert!(!plan.removed_segments.is_empty());
    }

    #[test]
    fn test_marker_based_cut_carries_real_transcript_words() {
        use crate::models::Word;

        let words = vec![
            Word { word: "slate".into(), start: Some(1.0), end: Some(1.2) },
            Word { word: "order".into(), start: Some(1.5), end: Some(1.7) },
            Word { word: "one".into(), start: Some(1.8), end: Some(2.0) },
            Word { word: "done".into(), start: Some(2.1), end: Some(2.3) },
            Word { word: "hello".into(), start: Some(3.0), end: Some(3.4) },
            Word { word: "world".into(), start: Some(3.5), end: Some(3.9) },
        ];
        let transcript = Transcript {
            text: String::new(),
            language: String::new(),
            duration: None,
            words,
            segments: Vec::new(),
            source_file: Some(PathBuf::from("clip.mov")),
        };

        let mut clip = ClipAnalysis::new(PathBuf::from("clip.mov"));
        clip.duration = 20.0;
        clip.has_speech = true;
        clip.markers = detect_markers(&transcript);
        clip.words = transcript.words.clone();

        let mut engine = RoughCutEngine::new(ScoringConfig::default());
        engine.clips.push(clip);

        let plan = engine
            .create_rough_cut(CutStyle::Episode, None, false, true)
            .unwrap();

        assert_eq!(plan.segments.len(), 1);
        assert_eq!(plan.segments[0].text, "hello world");
    }
}
