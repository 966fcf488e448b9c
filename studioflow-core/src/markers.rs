//! Marker detector (§4.3): scans a word-timestamped transcript for
//! `slate … done` regions and emits classified [`AudioMarker`] records.

use crate::command_parser::parse_commands;
use crate::lexer::{fold_command_variants, normalize_word, DONE_VARIANTS, SLATE_VARIANTS};
use crate::models::{AudioMarker, MarkerType, ParsedCommands, Transcript, Word};

const FALLBACK_WINDOW: f64 = 10.0;
const START_CUT_PADDING: f64 = 0.2;
const STANDALONE_FALLBACK_PADDING: f64 = 0.5;
const END_CUT_PADDING: f64 = 0.3;

fn is_slate(word: &str) -> bool {
    SLATE_VARIANTS.contains(&normalize_word(word).as_str())
}

fn is_done(word: &str) -> bool {
    DONE_VARIANTS.contains(&normalize_word(word).as_str())
}

fn classify(parsed: &ParsedCommands) -> MarkerType {
    if !parsed.retroactive_actions.is_empty() {
        MarkerType::Retroactive
    } else if parsed.ending == Some(true) {
        // Unreachable given the parser's contract (§4.2/§9) — `ending` alone
        // never sets `Some(true)` — kept so the branch exists per the
        // deprecated-compatibility note.
        MarkerType::Retroactive
    } else if parsed.take.is_some()
        || parsed.order.is_some()
        || parsed.scene_number.is_some()
        || parsed.step.is_some()
    {
        MarkerType::Start
    } else {
        MarkerType::Standalone
    }
}

/// First word in `words` with `start > after`, if any has timestamps.
fn first_word_after(words: &[Word], after: f64) -> Option<&Word> {
    words
        .iter()
        .find(|w| w.start.map(|s| s > after).unwrap_or(false))
}

/// Last word in `words` with `end < before`, if any has timestamps.
fn last_word_before(words: &[Word], before: f64) -> Option<&Word> {
    words
        .iter()
        .rev()
        .find(|w| w.end.map(|e| e < before).unwrap_or(false))
}

fn calculate_cut_point(
    marker_type: MarkerType,
    slate_time: f64,
    done_time: f64,
    words: &[Word],
) -> f64 {
    match marker_type {
        MarkerType::Start => match first_word_after(words, done_time) {
            Some(w) => (done_time).max(w.start.unwrap_or(done_time) - START_CUT_PADDING),
            None => done_time,
        },
        MarkerType::Standalone => match first_word_after(words, done_time) {
            Some(w) => (done_time).max(w.start.unwrap_or(done_time) - START_CUT_PADDING),
            None => done_time + STANDALONE_FALLBACK_PADDING,
        },
        MarkerType::Retroactive => done_time,
        MarkerType::EndDeprecated => match last_word_before(words, slate_time) {
            Some(w) => slate_time.min(w.end.unwrap_or(slate_time) + END_CUT_PADDING),
            None => slate_time,
        },
    }
}

/// Detects all `slate … done` marker regions in `transcript`.
pub fn detect_markers(transcript: &Transcript) -> Vec<AudioMarker> {
    let words = &transcript.words;
    let mut markers = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let word = &words[i];
        let Some(slate_time) = word.start else {
            i += 1;
            continue;
        };
        if !is_slate(&word.word) {
            i += 1;
            continue;
        }

        let cutoff = slate_time + FALLBACK_WINDOW;
        let mut commands: Vec<String> = Vec::new();
        let mut done_found = false;
        let mut done_time = cutoff;
        let mut j = i + 1;

        while j < words.len() {
            let w = &words[j];
            let Some(w_start) = w.start else {
                j += 1;
                continue;
            };
            if w_start > cutoff {
                break;
            }
            if is_done(&w.word) {
                done_found = true;
                done_time = w.end.unwrap_or(w_start);
                break;
            }
            commands.push(w.word.clone());
            j += 1;
        }

        if !commands.is_empty() || done_found {
            let normalized_tokens: Vec<String> =
                commands.iter().map(|w| normalize_word(w)).collect();
            let folded_tokens = fold_command_variants(&normalized_tokens);
            let parsed = parse_commands(&folded_tokens);
            let marker_type = classify(&parsed);
            let cut_point = calculate_cut_point(marker_type, slate_time, done_time, words);

            markers.push(AudioMarker {
                timestamp: slate_time,
                marker_type,
                commands,
                parsed_commands: parsed,
                done_time,
                cut_point,
                source_file: transcript.source_file.clone(),
            });

            i = if done_found { j + 1 } else { j };
        } else {
            i += 1;
        }
    }

    markers
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_empty_word_list_yields_empty_markers() {
        assert!(detect_markers(&transcript(Vec::new())).is_empty());
    }

    #[test]
    fn test_single_start_marker_scenario_1() {
        let t = transcript(vec![
            w("slate", 1.0, 1.2),
            w("naming", 1.5, 1.7),
            w("setup", 2.0, 2.2),
            w("done", 2.3, 2.5),
            w("first", 3.5, 3.8),
        ]);
        let markers = detect_markers(&t);
        assert_eq!(markers.len(), 1);
        let m = &markers[0];
        assert_eq!(m.commands, vec!["naming".to_string(), "setup".to_string()]);
        assert_eq!(m.done_time, 2.5);
        assert!((m.cut_point - 3.3).abs() < 1e-9);
    }

    #[test]
    fn test_case_variant_slate_and_trailing_punctuation() {
        let t = transcript(vec![
            w("Slate.", 1.0, 1.2),
            w("mark", 1.5, 1.7),
            w("Done!", 2.3, 2.5),
        ]);
        let markers = detect_markers(&t);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].marker_type, MarkerType::Standalone);
    }

    #[test]
    fn test_phonetic_variant_scenario_4() {
        let t = transcript(vec![
            w("slait", 1.0, 1.2),
            w("mark", 1.5, 1.7),
            w("dun", 2.3, 2.5),
        ]);
        let markers = detect_markers(&t);
        assert_eq!(markers.len(), 1);
        let m = &markers[0];
        assert_eq!(m.marker_type, MarkerType::Standalone);
        assert_eq!(m.timestamp, 1.0);
        assert_eq!(m.done_time, 2.5);
    }

    #[test]
    fn test_unterminated_slate_scenario_5() {
        let t = transcript(vec![w("slate", 1.0, 1.2), w("order", 1.5, 1.7), w("one", 2.0, 2.2)]);
        let markers = detect_markers(&t);
        assert_eq!(markers.len(), 1);
        let m = &markers[0];
        assert_eq!(m.marker_type, MarkerType::Start);
        assert_eq!(m.done_time, 11.0);
        assert_eq!(m.commands, vec!["order".to_string(), "one".to_string()]);
        assert_eq!(m.parsed_commands.order, Some(1));
    }

    #[test]
    fn test_word_missing_start_is_skipped() {
        let mut words = vec![w("slate", 1.0, 1.2)];
        words.push(Word {
            word: "garbled".to_string(),
            start: None,
            end: None,
        });
        words.push(w("done", 2.0, 2.2));
        let markers = detect_markers(&transcript(words));
        assert_eq!(markers.len(), 1);
    }

    #[test]
    fn test_retroactive_best_classification() {
        let t = transcript(vec![
            w("slate", 1.0, 1.2),
            w("apply", 1.5, 1.7),
            w("best", 1.8, 2.0),
            w("done", 2.1, 2.3),
        ]);
        let markers = detect_markers(&t);
        assert_eq!(markers[0].marker_type, MarkerType::Retroactive);
        assert_eq!(markers[0].cut_point, markers[0].done_time);
    }

    #[test]
    fn test_phrasal_broll_variant_folds_before_parsing() {
        let t = transcript(vec![
            w("slate", 1.0, 1.2),
            w("b", 1.5, 1.6),
            w("roll", 1.7, 1.8),
            w("intro", 1.9, 2.0),
            w("done", 2.1, 2.3),
        ]);
        let markers = detect_markers(&t);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].parsed_commands.broll, Some("intro".to_string()));
    }

    #[test]
    fn test_phrasal_cta_variant_folds_before_parsing() {
        let t = transcript(vec![
            w("slate", 1.0, 1.2),
            w("see", 1.5, 1.6),
            w("tea", 1.7, 1.8),
            w("subscribe", 1.9, 2.0),
            w("done", 2.1, 2.3),
        ]);
        let markers = detect_markers(&t);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].parsed_commands.cta, Some("subscribe".to_string()));
    }

    #[test]
    fn test_single_token_hyphenated_broll_variant_folds() {
        let t = transcript(vec![
            w("slate", 1.0, 1.2),
            w("b-roll", 1.5, 1.6),
            w("drone", 1.7, 1.8),
            w("done", 1.9, 2.1),
        ]);
        let markers = detect_markers(&t);
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].parsed_commands.broll, Some("drone".to_string()));
    }
}
