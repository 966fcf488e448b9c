//! Command lexer & normalizer (§4.1).
//!
//! Turns the raw word stream between a `slate` and `done` marker into a
//! normalized token list: lowercased, punctuation stripped, common
//! mis-transcriptions folded onto their canonical spelling.

/// Words a transcription engine commonly substitutes for "slate".
pub const SLATE_VARIANTS: &[&str] = &["slate", "state", "slait", "slayt", "sleight"];

/// Words a transcription engine commonly substitutes for "done".
///
/// Includes `doone`, present in the source marker grammar but dropped by
/// the distilled keyword table (see Design Notes).
pub const DONE_VARIANTS: &[&str] = &["done", "dun", "don", "dunn", "doan", "doné", "dawn", "doone"];

/// Number words 0-20 plus the decade words used by `parse_number`.
fn number_word_value(word: &str) -> Option<u32> {
    let v = match word {
        "zero" => 0,
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        _ => return None,
    };
    Some(v)
}

/// Lowercases and strips leading/trailing punctuation from a single token.
pub fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// Single-token spellings that fold onto a canonical keyword without
/// consuming a neighbor (`b-roll`, `b_roll` -> `broll`).
const SINGLE_TOKEN_ALIASES: &[(&str, &str)] = &[("b-roll", "broll"), ("b_roll", "broll")];

/// Multi-token phrasal variants, longest-match-first, that fold onto a
/// canonical keyword (§4.1: `broll ← {"b roll", "b-roll", "b_roll", "be
/// roll"}`, `cta ← {"c t a", "see t a", "see tea"}`).
const PHRASE_VARIANTS: &[(&[&str], &str)] = &[
    (&["see", "t", "a"], "cta"),
    (&["see", "tea"], "cta"),
    (&["c", "t", "a"], "cta"),
    (&["be", "roll"], "broll"),
    (&["b", "roll"], "broll"),
];

/// Folds multi-word and hyphenated/underscored phrasal variants in an
/// already-normalized token stream onto their canonical single-token
/// keyword, so the parser only ever sees `broll`/`cta`/etc. (§4.1).
pub fn fold_command_variants(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let mut matched = false;
        for (seq, canonical) in PHRASE_VARIANTS {
            let end = i + seq.len();
            if end <= tokens.len() && tokens[i..end].iter().map(String::as_str).eq(seq.iter().copied()) {
                out.push(canonical.to_string());
                i = end;
                matched = true;
                break;
            }
        }
        if matched {
            continue;
        }
        let tok = tokens[i].as_str();
        match SINGLE_TOKEN_ALIASES.iter().find(|(k, _)| *k == tok) {
            Some((_, canonical)) => out.push(canonical.to_string()),
            None => out.push(tok.to_string()),
        }
        i += 1;
    }
    out
}

/// Tokenizes a raw text span into normalized words, dropping empties.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize_word)
        .filter(|w| !w.is_empty())
        .collect()
}

/// Parses a single number word ("five" -> 5) or a literal digit token.
pub fn parse_number(token: &str) -> Option<i64> {
    if let Ok(n) = token.parse::<i64>() {
        return Some(n);
    }
    number_word_value(token).map(|v| v as i64)
}

/// Parses "one point five" style decimal numbers starting at `tokens[start]`.
///
/// Returns `(value, tokens_consumed)`. Supports up to 3 digits after the
/// decimal point ("one point two five zero" -> 1.25, three words consumed
/// after "point"). A non-number word after "point" stops consumption with
/// whatever digits were already gathered; "point" with zero following
/// digit-words yields the whole-number part unchanged and consumes only the
/// leading integer token plus "point".
pub fn parse_decimal_number(tokens: &[String], start: usize) -> Option<(f64, usize)> {
    let whole = parse_number(tokens.get(start)?)?;
    let mut consumed = 1;

    if tokens.get(start + 1).map(String::as_str) != Some("point") {
        return Some((whole as f64, consumed));
    }
    consumed += 1;

    let mut frac_digits = Vec::new();
    let mut i = start + 2;
    while frac_digits.len() < 3 {
        match tokens.get(i).and_then(|t| parse_number(t)) {
            Some(d) if (0..=9).contains(&d) => {
                frac_digits.push(d);
                i += 1;
            }
            _ => break,
        }
    }
    consumed = i - start;

    if frac_digits.is_empty() {
        return Some((whole as f64, consumed));
    }

    let frac_str: String = frac_digits.iter().map(|d| d.to_string()).collect();
    let frac_value: f64 = format!("0.{frac_str}").parse().unwrap_or(0.0);
    Some((whole as f64 + frac_value, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_word_strips_punctuation_and_lowercases() {
        assert_eq!(normalize_word("Scene,"), "scene");
        assert_eq!(normalize_word("\"Done\""), "done");
    }

    #[test]
    fn test_tokenize_drops_empties() {
        assert_eq!(
            tokenize("Slate,  scene two. Done!"),
            vec!["slate", "scene", "two", "done"]
        );
    }

    #[test]
    fn test_parse_number_word_and_digit() {
        assert_eq!(parse_number("five"), Some(5));
        assert_eq!(parse_number("12"), Some(12));
        assert_eq!(parse_number("banana"), None);
    }

    #[test]
    fn test_parse_decimal_number_whole_only() {
        let tokens = vec!["three".to_string()];
        assert_eq!(parse_decimal_number(&tokens, 0), Some((3.0, 1)));
    }

    #[test]
    fn test_parse_decimal_number_one_point_five() {
        let tokens = vec!["one".to_string(), "point".to_string(), "five".to_string()];
        assert_eq!(parse_decimal_number(&tokens, 0), Some((1.5, 3)));
    }

    #[test]
    fn test_parse_decimal_number_three_digit_fraction() {
        let tokens = vec![
            "one".to_string(),
            "point".to_string(),
            "two".to_string(),
            "five".to_string(),
            "zero".to_string(),
        ];
        assert_eq!(parse_decimal_number(&tokens, 0), Some((1.25, 5)));
    }

    #[test]
    fn test_parse_decimal_number_point_with_no_following_digits() {
        let tokens = vec!["two".to_string(), "point".to_string(), "scene".to_string()];
        assert_eq!(parse_decimal_number(&tokens, 0), Some((2.0, 2)));
    }

    #[test]
    fn test_done_variants_include_doone() {
        assert!(DONE_VARIANTS.contains(&"doone"));
    }
}
