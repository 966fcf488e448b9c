//! Command parser (§4.2): turns a token list between `slate` and `done`
//! into a [`ParsedCommands`] record via a left-to-right state machine.

use crate::lexer::{parse_decimal_number, parse_number};
use crate::models::{ParsedCommands, Quality, TitleType};

/// Every keyword the parser recognizes at the top level, used both for
/// dispatch and as the stop set for free-text collectors (§4.2).
const KEYWORDS: &[&str] = &[
    "mark", "take", "scene", "order", "step", "type", "best", "select", "backup", "hook",
    "title", "effect", "transition", "screen", "cta", "broll", "chapter", "emotion", "energy",
    "naming", "apply", "ending", "done",
];

fn is_keyword(token: &str) -> bool {
    KEYWORDS.contains(&token)
}

/// Parses the command tokens strictly between `slate` and its matching
/// `done` (already excluded by the caller).
pub fn parse_commands(tokens: &[String]) -> ParsedCommands {
    let mut parsed = ParsedCommands {
        tokens: tokens.to_vec(),
        ..Default::default()
    };

    let mut i = 0;
    while i < tokens.len() {
        let tok = tokens[i].as_str();
        match tok {
            "mark" => {
                parsed.mark = true;
                i += 1;
            }
            "apply" => {
                i += 1;
                while i < tokens.len() {
                    let action = tokens[i].clone();
                    if let Some(q) = Quality::from_word(&action) {
                        if parsed.score.is_none() {
                            parsed.score = Some(q);
                            parsed.score_level = Some(q.level());
                        }
                    }
                    parsed.retroactive_actions.push(action);
                    i += 1;
                }
            }
            "ending" => {
                i += 1;
                if i < tokens.len() {
                    // Deprecated: behaves as `apply` when followed by tokens.
                    while i < tokens.len() {
                        let action = tokens[i].clone();
                        if let Some(q) = Quality::from_word(&action) {
                            if parsed.score.is_none() {
                                parsed.score = Some(q);
                                parsed.score_level = Some(q.level());
                            }
                        }
                        parsed.retroactive_actions.push(action);
                        i += 1;
                    }
                } else {
                    parsed.ending = Some(false);
                }
            }
            "emotion" => {
                i += 1;
                if let Some(t) = tokens.get(i) {
                    parsed.emotion = Some(t.clone());
                    i += 1;
                }
            }
            "energy" => {
                i += 1;
                if let Some(t) = tokens.get(i) {
                    parsed.energy = Some(t.clone());
                    i += 1;
                }
            }
            "naming" => {
                // Disabled grammar slot: consume only the keyword.
                i += 1;
            }
            "scene" => {
                i += 1;
                if let Some((value, consumed)) = parse_decimal_number(tokens, i) {
                    parsed.scene_number = Some(value);
                    i += consumed;
                }
                let (name, next) = collect_free_text(tokens, i);
                if !name.is_empty() {
                    parsed.scene_name = Some(name);
                }
                i = next;
            }
            "take" => {
                i += 1;
                if let Some(t) = tokens.get(i).and_then(|t| parse_number(t)) {
                    parsed.take = Some(t);
                    i += 1;
                }
            }
            "order" => {
                i += 1;
                if let Some(t) = tokens.get(i).and_then(|t| parse_number(t)) {
                    parsed.order = Some(t);
                    i += 1;
                }
            }
            "step" => {
                i += 1;
                if let Some(t) = tokens.get(i).and_then(|t| parse_number(t)) {
                    parsed.step = Some(t);
                    i += 1;
                }
            }
            "type" => {
                i += 1;
                if let Some(t) = tokens.get(i) {
                    parsed.segment_type = Some(t.clone());
                    i += 1;
                }
            }
            "best" | "select" | "backup" => {
                parsed.quality = Quality::from_word(tok).or(Some(Quality::Best));
                i += 1;
            }
            "hook" => {
                i += 1;
                if let Some(t) = tokens.get(i) {
                    parsed.hook = Some(t.clone());
                    i += 1;
                }
            }
            "title" => {
                i += 1;
                if let Some(t) = tokens.get(i) {
                    let title_type = match t.as_str() {
                        "lower" => Some(TitleType::Lower),
                        "full" => Some(TitleType::Full),
                        "upper" => Some(TitleType::Upper),
                        _ => None,
                    };
                    if title_type.is_some() {
                        parsed.title_type = title_type;
                        i += 1;
                        // Optional "third" qualifier tolerated and skipped.
                        if tokens.get(i).map(String::as_str) == Some("third") {
                            i += 1;
                        }
                    }
                }
                let (text, next) = collect_free_text(tokens, i);
                if !text.is_empty() {
                    parsed.title = Some(text);
                }
                i = next;
            }
            "effect" => {
                i += 1;
                let product = tokens.get(i).cloned();
                let name = tokens.get(i + 1).cloned();
                if let (Some(product), Some(name)) = (product, name) {
                    parsed.effect = Some(format!("{product}:{name}"));
                    parsed.effect_product = Some(product);
                    parsed.effect_name = Some(name);
                    i += 2;
                }
            }
            "transition" => {
                i += 1;
                let first = tokens.get(i).cloned();
                let second = tokens.get(i + 1).filter(|t| !is_keyword(t)).cloned();
                match (first, second) {
                    (Some(product), Some(name)) => {
                        parsed.transition = Some(format!("{product}:{name}"));
                        parsed.transition_product = Some(product);
                        parsed.transition_name = Some(name);
                        i += 2;
                    }
                    (Some(generic), None) => {
                        parsed.transition = Some(generic.clone());
                        parsed.transition_generic = Some(generic);
                        i += 1;
                    }
                    (None, _) => {}
                }
            }
            "screen" => {
                i += 1;
                if let Some(t) = tokens.get(i) {
                    parsed.screen = Some(t.clone());
                    i += 1;
                }
            }
            "cta" => {
                i += 1;
                if let Some(t) = tokens.get(i) {
                    parsed.cta = Some(t.clone());
                    i += 1;
                }
            }
            "broll" => {
                i += 1;
                if let Some(t) = tokens.get(i) {
                    parsed.broll = Some(t.clone());
                    i += 1;
                }
            }
            "chapter" => {
                i += 1;
                let (text, next) = collect_free_text(tokens, i);
                if !text.is_empty() {
                    parsed.chapter = Some(text);
                }
                i = next;
            }
            _ => {
                // Unknown tokens are silently skipped.
                i += 1;
            }
        }
    }

    parsed
}

/// Collects tokens starting at `start` until the first recognized keyword,
/// joining with single spaces. Returns the joined text and the index of the
/// stopping token.
fn collect_free_text(tokens: &[String], start: usize) -> (String, usize) {
    let mut i = start;
    let mut words = Vec::new();
    while i < tokens.len() && !is_keyword(&tokens[i]) {
        words.push(tokens[i].as_str());
        i += 1;
    }
    (words.join(" "), i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_mark_keyword() {
        let parsed = parse_commands(&toks("mark"));
        assert!(parsed.mark);
    }

    #[test]
    fn test_scene_number_and_name() {
        let parsed = parse_commands(&toks("scene two kitchen interview"));
        assert_eq!(parsed.scene_number, Some(2.0));
        assert_eq!(parsed.scene_name.as_deref(), Some("kitchen interview"));
    }

    #[test]
    fn test_scene_name_stops_at_keyword() {
        let parsed = parse_commands(&toks("scene one kitchen take two"));
        assert_eq!(parsed.scene_name.as_deref(), Some("kitchen"));
        assert_eq!(parsed.take, Some(2));
    }

    #[test]
    fn test_order_mirrors_into_effective_scene_number() {
        let parsed = parse_commands(&toks("order two"));
        assert_eq!(parsed.order, Some(2));
        assert_eq!(parsed.effective_scene_number(), Some(2.0));
    }

    #[test]
    fn test_apply_best_sets_score() {
        let parsed = parse_commands(&toks("apply best"));
        assert_eq!(parsed.retroactive_actions, vec!["best".to_string()]);
        assert_eq!(parsed.score, Some(Quality::Best));
        assert_eq!(parsed.score_level, Some(3));
    }

    #[test]
    fn test_apply_remove() {
        let parsed = parse_commands(&toks("apply remove"));
        assert_eq!(parsed.retroactive_actions, vec!["remove".to_string()]);
        assert_eq!(parsed.score, None);
    }

    #[test]
    fn test_lone_ending_sets_false_only() {
        let parsed = parse_commands(&toks("ending"));
        assert_eq!(parsed.ending, Some(false));
        assert!(parsed.retroactive_actions.is_empty());
    }

    #[test]
    fn test_ending_followed_by_tokens_behaves_as_apply() {
        let parsed = parse_commands(&toks("ending good"));
        assert_eq!(parsed.ending, None);
        assert_eq!(parsed.retroactive_actions, vec!["good".to_string()]);
        assert_eq!(parsed.score, Some(Quality::Good));
    }

    #[test]
    fn test_naming_consumes_only_keyword() {
        let parsed = parse_commands(&toks("naming whatever scene two"));
        assert_eq!(parsed.scene_number, None);
        assert_eq!(parsed.scene_name, None);
    }

    #[test]
    fn test_title_with_type_and_third() {
        let parsed = parse_commands(&toks("title lower third big reveal"));
        assert_eq!(parsed.title_type, Some(TitleType::Lower));
        assert_eq!(parsed.title.as_deref(), Some("big reveal"));
    }

    #[test]
    fn test_effect_two_args() {
        let parsed = parse_commands(&toks("effect sapphire glow"));
        assert_eq!(parsed.effect_product.as_deref(), Some("sapphire"));
        assert_eq!(parsed.effect_name.as_deref(), Some("glow"));
        assert_eq!(parsed.effect.as_deref(), Some("sapphire:glow"));
    }

    #[test]
    fn test_transition_generic_single_arg() {
        let parsed = parse_commands(&toks("transition crossfade"));
        assert_eq!(parsed.transition_generic.as_deref(), Some("crossfade"));
        assert_eq!(parsed.transition.as_deref(), Some("crossfade"));
    }

    #[test]
    fn test_transition_product_two_args() {
        let parsed = parse_commands(&toks("transition sapphire wipe"));
        assert_eq!(parsed.transition_product.as_deref(), Some("sapphire"));
        assert_eq!(parsed.transition_name.as_deref(), Some("wipe"));
    }

    #[test]
    fn test_unknown_tokens_skipped() {
        let parsed = parse_commands(&toks("umm mark uhh"));
        assert!(parsed.mark);
    }

    #[test]
    fn test_repeated_keys_keep_last_value() {
        let parsed = parse_commands(&toks("take one take two"));
        assert_eq!(parsed.take, Some(2));
    }
}
