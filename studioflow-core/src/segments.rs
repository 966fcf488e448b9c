//! Segment extractor (§4.4): turns an ordered marker list into a
//! non-overlapping, scored, sorted [`Segment`] list.

use std::path::PathBuf;

use crate::models::{AudioMarker, MarkerInfo, MarkerType, Quality, Segment, Transcript, Word};

const END_BOUNDARY_PADDING: f64 = 0.3;
const NO_BOUNDARY_FALLBACK: f64 = 10.0;

struct Building {
    start_time: f64,
    end_time: f64,
    quality: Option<Quality>,
    marker_info: MarkerInfo,
    remove: bool,
}

fn last_word_end_before(words: &[Word], before: f64) -> Option<f64> {
    words
        .iter()
        .rev()
        .filter_map(|w| w.end)
        .find(|&end| end < before)
}

fn quality_score(quality: Option<Quality>) -> f64 {
    match quality {
        Some(q) => q.level() as f64 / 3.0,
        None => 0.5,
    }
}

fn resolve_end_time(
    markers: &[AudioMarker],
    idx: usize,
    words: &[Word],
    clip_duration: Option<f64>,
) -> f64 {
    if let Some(next) = markers.get(idx + 1) {
        let padded = last_word_end_before(words, next.timestamp)
            .map(|e| e + END_BOUNDARY_PADDING)
            .unwrap_or(next.timestamp);
        return next.timestamp.min(padded);
    }

    if let Some(end_marker) = markers[..idx]
        .iter()
        .rev()
        .find(|m| m.marker_type == MarkerType::EndDeprecated)
    {
        return end_marker.cut_point;
    }

    if let Some(duration) = clip_duration {
        return duration;
    }
    if let Some(last_end) = words.iter().filter_map(|w| w.end).last() {
        return last_end + NO_BOUNDARY_FALLBACK;
    }
    markers[idx].cut_point + NO_BOUNDARY_FALLBACK
}

fn extract_text(words: &[Word], start: f64, end: f64) -> String {
    words
        .iter()
        .filter(|w| w.start.map(|s| s >= start).unwrap_or(false) && w.end.map(|e| e <= end).unwrap_or(false))
        .map(|w| w.word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds segments from `markers` detected on `transcript`, for the clip at
/// `source_file` with an optional known `clip_duration`.
pub fn extract_segments_from_markers(
    markers: &[AudioMarker],
    transcript: &Transcript,
    source_file: PathBuf,
    clip_duration: Option<f64>,
) -> Vec<Segment> {
    let mut sorted: Vec<&AudioMarker> = markers.iter().collect();
    sorted.sort_by(|a, b| a.timestamp.partial_cmp(&b.timestamp).unwrap());
    let sorted: Vec<AudioMarker> = sorted.into_iter().cloned().collect();

    let mut building: Vec<Building> = Vec::new();

    for (idx, marker) in sorted.iter().enumerate() {
        match marker.marker_type {
            MarkerType::Start | MarkerType::Standalone => {
                let start_time = marker.cut_point;
                let end_time = resolve_end_time(&sorted, idx, &transcript.words, clip_duration);
                let parsed = &marker.parsed_commands;
                let quality = parsed.quality.or(parsed.score);

                building.push(Building {
                    start_time,
                    end_time,
                    quality,
                    marker_info: MarkerInfo {
                        scene_number: parsed.effective_scene_number(),
                        scene_name: parsed.scene_name.clone(),
                        take: parsed.take,
                        order: parsed.order,
                        step: parsed.step,
                        emotion: parsed.emotion.clone(),
                        energy: parsed.energy.clone(),
                        hook: parsed.hook.clone(),
                        is_quote: false,
                        retroactive_actions: Vec::new(),
                    },
                    remove: false,
                });
            }
            MarkerType::Retroactive => {
                let parsed = marker.parsed_commands.clone();
                let new_quality = parsed.score.or(parsed.quality);

                if new_quality == Some(Quality::Best) {
                    let last_idx = building.len().saturating_sub(1);
                    for (i, seg) in building.iter_mut().enumerate() {
                        if i != last_idx && seg.quality == Some(Quality::Best) {
                            seg.quality = Some(Quality::Good);
                        }
                    }
                }

                if let Some(last) = building.last_mut() {
                    if let Some(q) = new_quality {
                        last.quality = Some(q);
                    }
                    if parsed
                        .retroactive_actions
                        .iter()
                        .any(|a| a == "remove" || a == "skip")
                    {
                        last.remove = true;
                    }
                    if parsed.retroactive_actions.iter().any(|a| a == "quote") {
                        last.marker_info.is_quote = true;
                    }
                    if let Some(hook) = &parsed.hook {
                        last.marker_info.hook = Some(hook.clone());
                    }
                    last.marker_info.retroactive_actions = parsed.retroactive_actions.clone();
                }
            }
            MarkerType::EndDeprecated => {}
        }
    }

    let mut segments: Vec<Segment> = building
        .into_iter()
        .filter(|b| !b.remove)
        .map(|b| Segment {
            source_file: source_file.clone(),
            start_time: b.start_time,
            end_time: b.end_time,
            text: extract_text(&transcript.words, b.start_time, b.end_time),
            speaker: None,
            topic: None,
            score: quality_score(b.quality),
            segment_type: b
                .marker_info
                .scene_name
                .clone()
                .unwrap_or_else(|| "content".to_string()),
            marker_info: Some(b.marker_info),
        })
        .collect();

    segments.sort_by(|a, b| a.order_key().partial_cmp(&b.order_key()).unwrap());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParsedCommands;

    fn marker(
        timestamp: f64,
        marker_type: MarkerType,
        done_time: f64,
        cut_point: f64,
        parsed: ParsedCommands,
    ) -> AudioMarker {
        AudioMarker {
            timestamp,
            marker_type,
            commands: Vec::new(),
            parsed_commands: parsed,
            done_time,
            cut_point,
            source_file: None,
        }
    }

    fn w(word: &str, start: f64, end: f64) -> Word {
        Word {
            word: word.to_string(),
            start: Some(start),
            end: Some(end),
        }
    }

    fn transcript(words: Vec<Word>) -> Transcript {
        Transcript {
            text: String::new(),
            language: String::new(),
            duration: None,
            words,
            segments: Vec::new(),
            source_file: None,
        }
    }

    #[test]
    fn test_two_start_markers_scenario_2() {
        let words = vec![
            w("slate", 1.0, 1.2),
            w("naming", 1.5, 1.7),
            w("setup", 2.0, 2.2),
            w("done", 2.3, 2.5),
            w("first", 3.5, 3.8),
            w("slate", 10.0, 10.2),
            w("order", 10.5, 10.7),
            w("two", 11.0, 11.2),
            w("done", 11.3, 11.5),
        ];
        let t = transcript(words);

        let mut p1 = ParsedCommands::default();
        p1.tokens = vec!["naming".into(), "setup".into()];
        let m1 = marker(1.0, MarkerType::Standalone, 2.5, 3.3, p1);

        let mut p2 = ParsedCommands::default();
        p2.order = Some(2);
        let m2 = marker(10.0, MarkerType::Start, 11.5, 11.5, p2);

        let segs = extract_segments_from_markers(
            &[m1, m2],
            &t,
            PathBuf::from("clip.mov"),
            Some(20.0),
        );
        assert_eq!(segs.len(), 2);
        // segment 1 ends at min(10.0, last_word_before_10.0.end + 0.3) = min(10.0, 3.8+0.3=4.1) = 4.1
        assert!((segs[0].end_time - 4.1).abs() < 1e-9);
        assert_eq!(segs[1].end_time, 20.0);
    }

    #[test]
    fn test_retroactive_best_demotes_prior_best_scenario_3() {
        let t = transcript(vec![w("a", 0.0, 1.0), w("b", 20.0, 21.0)]);

        let mut p1 = ParsedCommands::default();
        p1.scene_number = Some(1.0);
        let m1 = marker(1.0, MarkerType::Start, 1.5, 1.5, p1);

        let mut apply1 = ParsedCommands::default();
        apply1.retroactive_actions = vec!["best".to_string()];
        apply1.score = Some(Quality::Best);
        let m2 = marker(1.6, MarkerType::Retroactive, 1.8, 1.8, apply1);

        let mut p2 = ParsedCommands::default();
        p2.scene_number = Some(2.0);
        let m3 = marker(10.0, MarkerType::Start, 10.5, 10.5, p2);

        let mut apply2 = ParsedCommands::default();
        apply2.retroactive_actions = vec!["best".to_string()];
        apply2.score = Some(Quality::Best);
        let m4 = marker(10.6, MarkerType::Retroactive, 10.8, 10.8, apply2);

        let segs = extract_segments_from_markers(
            &[m1, m2, m3, m4],
            &t,
            PathBuf::from("clip.mov"),
            Some(30.0),
        );
        assert_eq!(segs.len(), 2);
        // segment 1 (scene 1) demoted to "good" (score 2/3)
        assert!((segs[0].score - 2.0 / 3.0).abs() < 1e-9);
        // segment 2 (scene 2) keeps "best" (score 1.0)
        assert!((segs[1].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_retroactive_remove_drops_segment() {
        let t = transcript(vec![w("a", 0.0, 1.0)]);
        let p1 = ParsedCommands::default();
        let m1 = marker(1.0, MarkerType::Standalone, 1.5, 1.5, p1);

        let mut apply = ParsedCommands::default();
        apply.retroactive_actions = vec!["remove".to_string()];
        let m2 = marker(1.6, MarkerType::Retroactive, 1.8, 1.8, apply);

        let segs =
            extract_segments_from_markers(&[m1, m2], &t, PathBuf::from("clip.mov"), Some(5.0));
        assert!(segs.is_empty());
    }

    #[test]
    fn test_final_sort_by_scene_take_time() {
        let t = transcript(vec![w("a", 0.0, 100.0)]);

        let mut p_unnumbered = ParsedCommands::default();
        p_unnumbered.step = Some(1);
        let m_unnumbered = marker(5.0, MarkerType::Start, 5.5, 5.5, p_unnumbered);

        let mut p_scene1 = ParsedCommands::default();
        p_scene1.scene_number = Some(1.0);
        let m_scene1 = marker(20.0, MarkerType::Start, 20.5, 20.5, p_scene1);

        let segs = extract_segments_from_markers(
            &[m_unnumbered, m_scene1],
            &t,
            PathBuf::from("clip.mov"),
            Some(100.0),
        );
        // scene 1 sorts before the unnumbered (scene=+inf) segment.
        assert_eq!(segs[0].marker_info.as_ref().unwrap().scene_number, Some(1.0));
        assert_eq!(segs[1].marker_info.as_ref().unwrap().step, Some(1));
    }
}
