//! Transcript analyzer (§4.5): the marker-free fallback. Scores quote
//! importance, estimates sentiment, detects topics, finds natural edit
//! points, and runs the keyword-class detectors the style-specific
//! pipelines in `rough_cut.rs` build on.
//!
//! Sentiment analysis is specified as a three-tier fallback chain (lexicon
//! engine -> polarity library -> heuristic word list). Both richer tiers are
//! external NLP collaborators out of scope for this crate (§1); only the
//! heuristic tier is wired up here, so the chain always lands on it. The
//! observable contract (a float in [-1, 1], cached by normalized text) is
//! unaffected — only precision is.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use regex::Regex;

use crate::models::{NaturalEditPoint, Segment, SrtEntry};

const POSITIVE_WORDS: &[&str] = &[
    "love", "happy", "great", "wonderful", "amazing", "best", "good", "excellent",
];
const NEGATIVE_WORDS: &[&str] = &[
    "hate", "sad", "terrible", "awful", "worst", "bad", "horrible", "difficult",
];
const SENTIMENT_HIT_WEIGHT: f64 = 0.3;

const FILLER_WORDS: &[&str] = &["um", "uh", "like", "you know", "sort of", "kind of"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Introduction,
    Problem,
    PersonalStories,
    ExpertOpinions,
    Solutions,
    Conclusion,
    General,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Introduction => "introduction",
            Topic::Problem => "problem",
            Topic::PersonalStories => "personal_stories",
            Topic::ExpertOpinions => "expert_opinions",
            Topic::Solutions => "solutions",
            Topic::Conclusion => "conclusion",
            Topic::General => "general",
        }
    }
}

fn topic_keywords(topic: Topic) -> &'static [&'static str] {
    match topic {
        Topic::Introduction => &["welcome", "today we", "let's talk", "introduce", "my name is"],
        Topic::Problem => &["problem", "issue", "challenge", "struggle", "difficult", "frustrat"],
        Topic::PersonalStories => &["i remember", "when i was", "my experience", "happened to me", "i felt"],
        Topic::ExpertOpinions => &["research shows", "studies", "expert", "according to", "data suggests"],
        Topic::Solutions => &["solution", "fix", "solve", "here's how", "the answer", "recommend"],
        Topic::Conclusion => &["in conclusion", "to summarize", "finally", "wrap up", "thanks for watching"],
        Topic::General => &[],
    }
}

/// Groups keyword detectors so each pipeline in `rough_cut.rs` can pull the
/// one it needs without re-running the regex classes for every style.
pub struct TranscriptAnalyzer {
    sentiment_cache: HashMap<String, f64>,
    topic_cache: HashMap<String, Topic>,
    keyword_cache: HashMap<String, Vec<String>>,
    seen_quotes: HashSet<String>,

    feature_re: Regex,
    pro_re: Regex,
    con_re: Regex,
    reveal_strong_re: Regex,
    reveal_soft_re: Regex,
    comparison_re: Regex,
    concept_re: Regex,
    proper_bigram_re: Regex,
    year_re: Regex,
}

impl TranscriptAnalyzer {
    pub fn new() -> Self {
        Self {
            sentiment_cache: HashMap::new(),
            topic_cache: HashMap::new(),
            keyword_cache: HashMap::new(),
            seen_quotes: HashSet::new(),
            feature_re: Regex::new(r"(?i)\b(feature|comes with|includes|supports|built-in|capability)\b").unwrap(),
            pro_re: Regex::new(r"(?i)\b(i (really )?like|love|great thing|advantage|pro(s)? (is|are)|strength)\b").unwrap(),
            con_re: Regex::new(r"(?i)\b(i (don't|do not) like|downside|disadvantage|con(s)? (is|are)|weak(ness)?|issue with)\b").unwrap(),
            reveal_strong_re: Regex::new(r"(?i)\b(check (this|it) out|here it is|behold|unveil|ta-?da)\b").unwrap(),
            reveal_soft_re: Regex::new(r"(?i)\b(let's see|opening (it|this)|first look|what we have here)\b").unwrap(),
            comparison_re: Regex::new(r"(?i)\b(versus|vs\.?|compared to|on the other hand|whereas|better than|worse than)\b").unwrap(),
            concept_re: Regex::new(r"(?i)\b(the idea (is|behind)|concept of|what this means|in other words|essentially|basically)\b").unwrap(),
            proper_bigram_re: Regex::new(r"\b[A-Z][a-z]+\s[A-Z][a-z]+\b").unwrap(),
            year_re: Regex::new(r"\b(19|20)\d{2}\b").unwrap(),
        }
    }

    fn normalize(text: &str) -> String {
        text.trim().to_lowercase()
    }

    /// Heuristic sentiment in [-1, 1]: average of ±0.3 per matched word,
    /// clamped; 0.0 when nothing matches (§4.5).
    pub fn sentiment(&mut self, text: &str) -> f64 {
        let key = Self::normalize(text);
        if let Some(&cached) = self.sentiment_cache.get(&key) {
            return cached;
        }

        let mut hits = 0i32;
        let mut total = 0.0;
        for word in key.split_whitespace() {
            let w = word.trim_matches(|c: char| !c.is_alphanumeric());
            if POSITIVE_WORDS.contains(&w) {
                total += SENTIMENT_HIT_WEIGHT;
                hits += 1;
            } else if NEGATIVE_WORDS.contains(&w) {
                total -= SENTIMENT_HIT_WEIGHT;
                hits += 1;
            }
        }
        let score = if hits == 0 {
            0.0
        } else {
            (total / hits as f64).clamp(-1.0, 1.0)
        };
        self.sentiment_cache.insert(key, score);
        score
    }

    pub fn detect_topic(&mut self, text: &str) -> Topic {
        let key = Self::normalize(text);
        if let Some(&cached) = self.topic_cache.get(&key) {
            return cached;
        }

        let topic = [
            Topic::Introduction,
            Topic::Problem,
            Topic::PersonalStories,
            Topic::ExpertOpinions,
            Topic::Solutions,
            Topic::Conclusion,
        ]
        .into_iter()
        .find(|&t| topic_keywords(t).iter().any(|kw| key.contains(kw)))
        .unwrap_or(Topic::General);

        self.topic_cache.insert(key, topic);
        topic
    }

    /// Quote importance on 0..100 (§4.5).
    pub fn quote_importance(&mut self, text: &str) -> f64 {
        let key = Self::normalize(text);
        let mut score = 0.0;

        if !self.seen_quotes.contains(&key) {
            score += 30.0;
        }
        self.seen_quotes.insert(key.clone());

        let has_digit = text.chars().any(|c| c.is_ascii_digit());
        let has_proper_bigram = self.proper_bigram_re.is_match(text);
        let has_year = self.year_re.is_match(text);
        if has_digit || has_proper_bigram || has_year {
            score += 20.0;
        }

        score += self.sentiment(text).abs() * 20.0;

        let word_count = text.split_whitespace().count();
        if (10..30).contains(&word_count) {
            score += 15.0;
        } else if word_count >= 30 {
            score += 10.0;
        } else if (5..10).contains(&word_count) {
            score += 5.0;
        }

        if text.contains('?') {
            score += 10.0;
        }

        let filler_count = FILLER_WORDS
            .iter()
            .filter(|f| key.contains(*f))
            .count();
        if filler_count > 2 {
            score -= 15.0;
        }

        score.max(0.0)
    }

    /// Natural edit points from inter-entry gaps (§4.5).
    pub fn natural_edit_points(&self, entries: &[SrtEntry]) -> Vec<NaturalEditPoint> {
        let mut points = Vec::new();
        for pair in entries.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let gap = next.start_time - prev.end_time;
            if gap > 0.3 {
                let midpoint = prev.end_time + gap / 2.0;
                let mut confidence = (gap / 2.0).min(1.0);
                let ends_sentence = prev.text.trim_end().ends_with(['.', '!', '?']);
                if ends_sentence && gap <= 1.0 {
                    confidence = (confidence * 1.5).min(1.0);
                }
                points.push(NaturalEditPoint {
                    timestamp: midpoint,
                    confidence,
                });
            }
        }
        points
    }

    fn cached_keyword_matches(&mut self, cache_key: &str, text: &str, re: &Regex) -> bool {
        if let Some(hits) = self.keyword_cache.get(cache_key) {
            return hits.iter().any(|h| h == text);
        }
        let matched = re.is_match(text);
        if matched {
            self.keyword_cache
                .entry(cache_key.to_string())
                .or_default()
                .push(text.to_string());
        }
        matched
    }

    fn detector_segments(
        &mut self,
        entries: &[SrtEntry],
        source_file: &PathBuf,
        cache_prefix: &str,
        segment_type: &str,
        score_fn: impl Fn(&Regex, &Regex, &str) -> Option<f64>,
        re_a: &Regex,
        re_b: &Regex,
    ) -> Vec<Segment> {
        let mut out = Vec::new();
        for entry in entries {
            let cache_key = format!("{cache_prefix}:{}", entry.index);
            if let Some(score) = score_fn(re_a, re_b, &entry.text) {
                self.cached_keyword_matches(&cache_key, &entry.text, re_a);
                out.push(Segment {
                    source_file: source_file.clone(),
                    start_time: entry.start_time,
                    end_time: entry.end_time,
                    text: entry.text.clone(),
                    speaker: None,
                    topic: None,
                    score,
                    segment_type: segment_type.to_string(),
                    marker_info: None,
                });
            }
        }
        out
    }

    pub fn detect_features(&mut self, entries: &[SrtEntry], source_file: &PathBuf) -> Vec<Segment> {
        let re = self.feature_re.clone();
        self.detector_segments(
            entries,
            source_file,
            "feature",
            "feature",
            |re_a, _re_b, text| re_a.is_match(text).then_some(0.7),
            &re,
            &re,
        )
    }

    pub fn detect_pros_cons(&mut self, entries: &[SrtEntry], source_file: &PathBuf) -> Vec<Segment> {
        let pro = self.pro_re.clone();
        let con = self.con_re.clone();
        let mut out = self.detector_segments(
            entries,
            source_file,
            "pro",
            "pro",
            |re_a, _re_b, text| re_a.is_match(text).then_some(0.6),
            &pro,
            &pro,
        );
        out.extend(self.detector_segments(
            entries,
            source_file,
            "con",
            "con",
            |re_a, _re_b, text| re_a.is_match(text).then_some(0.6),
            &con,
            &con,
        ));
        out
    }

    pub fn detect_reveals(&mut self, entries: &[SrtEntry], source_file: &PathBuf) -> Vec<Segment> {
        let strong = self.reveal_strong_re.clone();
        let soft = self.reveal_soft_re.clone();
        self.detector_segments(
            entries,
            source_file,
            "reveal",
            "reveal",
            |re_a, re_b, text| {
                if re_a.is_match(text) {
                    Some(0.8)
                } else if re_b.is_match(text) {
                    Some(0.6)
                } else {
                    None
                }
            },
            &strong,
            &soft,
        )
    }

    pub fn detect_comparisons(&mut self, entries: &[SrtEntry], source_file: &PathBuf) -> Vec<Segment> {
        let re = self.comparison_re.clone();
        self.detector_segments(
            entries,
            source_file,
            "comparison",
            "comparison",
            |re_a, _re_b, text| re_a.is_match(text).then_some(0.7),
            &re,
            &re,
        )
    }

    pub fn detect_concepts(&mut self, entries: &[SrtEntry], source_file: &PathBuf) -> Vec<Segment> {
        let re = self.concept_re.clone();
        self.detector_segments(
            entries,
            source_file,
            "concept",
            "concept",
            |re_a, _re_b, text| re_a.is_match(text).then_some(0.7),
            &re,
            &re,
        )
    }
}

impl Default for TranscriptAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: u32, start: f64, end: f64, text: &str) -> SrtEntry {
        SrtEntry {
            index,
            start_time: start,
            end_time: end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_sentiment_positive_heuristic() {
        let mut a = TranscriptAnalyzer::new();
        assert!((a.sentiment("this is great and wonderful") - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_sentiment_no_hits_is_zero() {
        let mut a = TranscriptAnalyzer::new();
        assert_eq!(a.sentiment("the quick brown fox"), 0.0);
    }

    #[test]
    fn test_sentiment_is_cached() {
        let mut a = TranscriptAnalyzer::new();
        let first = a.sentiment("i hate this");
        assert_eq!(a.sentiment_cache.len(), 1);
        let second = a.sentiment("i hate this");
        assert_eq!(first, second);
    }

    #[test]
    fn test_detect_topic_introduction() {
        let mut a = TranscriptAnalyzer::new();
        assert_eq!(a.detect_topic("Welcome, today we talk about Rust"), Topic::Introduction);
    }

    #[test]
    fn test_detect_topic_general_fallback() {
        let mut a = TranscriptAnalyzer::new();
        assert_eq!(a.detect_topic("the sky is blue"), Topic::General);
    }

    #[test]
    fn test_quote_importance_unique_vs_repeat() {
        let mut a = TranscriptAnalyzer::new();
        let first = a.quote_importance("this changed everything for me");
        let second = a.quote_importance("this changed everything for me");
        assert!(first > second);
    }

    #[test]
    fn test_quote_importance_question_bonus() {
        let mut a = TranscriptAnalyzer::new();
        let score = a.quote_importance("have you ever wondered why?");
        assert!(score >= 10.0);
    }

    #[test]
    fn test_natural_edit_points_gap_and_confidence() {
        let a = TranscriptAnalyzer::new();
        let entries = vec![
            entry(1, 0.0, 1.0, "hello there."),
            entry(2, 1.5, 2.5, "next thought"),
        ];
        let points = a.natural_edit_points(&entries);
        assert_eq!(points.len(), 1);
        assert!((points[0].timestamp - 1.25).abs() < 1e-9);
        // gap=0.5, base confidence 0.25, sentence-end boost x1.5 -> 0.375
        assert!((points[0].confidence - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_natural_edit_points_no_gap_below_threshold() {
        let a = TranscriptAnalyzer::new();
        let entries = vec![entry(1, 0.0, 1.0, "a"), entry(2, 1.2, 2.0, "b")];
        assert!(a.natural_edit_points(&entries).is_empty());
    }

    #[test]
    fn test_detect_features() {
        let mut a = TranscriptAnalyzer::new();
        let entries = vec![entry(1, 0.0, 2.0, "this phone comes with a great camera")];
        let segs = a.detect_features(&entries, &PathBuf::from("clip.mov"));
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].score, 0.7);
    }

    #[test]
    fn test_detect_comparisons() {
        let mut a = TranscriptAnalyzer::new();
        let entries = vec![entry(1, 0.0, 2.0, "this one is better than the last model")];
        let segs = a.detect_comparisons(&entries, &PathBuf::from("clip.mov"));
        assert_eq!(segs.len(), 1);
        assert_eq!(segs[0].segment_type, "comparison");
    }
}
