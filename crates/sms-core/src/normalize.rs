//! GSM-7-safe text normalization for outbound message bodies.
//!
//! Rules, applied in order:
//! - fold typographic punctuation (curly quotes, dashes, ellipsis, odd
//!   spaces) to ASCII
//! - compatibility-decompose (NFKD) so accented letters keep their base form
//! - unify CRLF, CR, NEL and the Unicode line/paragraph separators to LF
//! - drop everything outside printable ASCII, newline and tab
//! - collapse runs of spaces/tabs to one space
//! - trim leading and trailing whitespace
//!
//! The output is printable ASCII plus `\n` and `normalize` is idempotent.

use unicode_normalization::UnicodeNormalization;

/// ASCII replacement for punctuation that NFKD leaves non-ASCII.
fn fold_punctuation(c: char) -> Option<&'static str> {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => Some("'"),
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => Some("\""),
        '\u{2010}'..='\u{2015}' | '\u{2212}' => Some("-"),
        '\u{2026}' => Some("..."),
        '\u{00A0}' | '\u{2007}' | '\u{202F}' => Some(" "),
        _ => None,
    }
}

/// Normalize arbitrary text to the constrained SMS character set.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.chars() {
        match fold_punctuation(c) {
            Some(ascii) => folded.push_str(ascii),
            None => folded.push(c),
        }
    }

    let decomposed: String = folded.nfkd().collect();
    let unified = decomposed
        .replace("\r\n", "\n")
        .replace(['\r', '\u{0085}', '\u{2028}', '\u{2029}'], "\n");

    let mut out = String::with_capacity(unified.len());
    let mut in_space_run = false;
    for c in unified.chars() {
        match c {
            ' ' | '\t' => {
                if !in_space_run {
                    out.push(' ');
                    in_space_run = true;
                }
            }
            '\n' => {
                out.push('\n');
                in_space_run = false;
            }
            c if c.is_ascii_graphic() => {
                out.push(c);
                in_space_run = false;
            }
            // stripped characters do not break a space run
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Length in characters, the unit every budget check uses.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Prefix of `s` holding at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_folds_curly_quotes() {
        assert_eq!(
            normalize("\u{201C}Don\u{2019}t be late\u{201D}"),
            "\"Don't be late\""
        );
    }

    #[test]
    fn test_folds_dashes_and_ellipsis() {
        assert_eq!(normalize("6pm \u{2014} 9pm"), "6pm - 9pm");
        assert_eq!(normalize("pages 3\u{2013}5"), "pages 3-5");
        assert_eq!(normalize("wait for it\u{2026}"), "wait for it...");
    }

    #[test]
    fn test_strips_emoji_and_keeps_spacing_sane() {
        assert_eq!(normalize("Party \u{1F389} time"), "Party time");
        assert_eq!(normalize("\u{1F389}\u{1F389}"), "");
    }

    #[test]
    fn test_accents_fold_to_base_letter() {
        assert_eq!(normalize("Caf\u{00E9} Ren\u{00E9}e"), "Cafe Renee");
    }

    #[test]
    fn test_line_endings_unified_and_preserved() {
        assert_eq!(normalize("one\r\ntwo\rthree\nfour"), "one\ntwo\nthree\nfour");
    }

    #[test]
    fn test_unicode_line_separators_become_newlines() {
        for sep in ['\u{2028}', '\u{2029}', '\u{0085}'] {
            let input = format!("Dinner at 6{sep}Dress code: formal");
            assert_eq!(
                normalize(&input),
                "Dinner at 6\nDress code: formal",
                "separator U+{:04X}",
                sep as u32
            );
        }
    }

    #[test]
    fn test_crlf_next_to_unicode_separator_keeps_both_breaks() {
        assert_eq!(normalize("a\r\n\u{2028}b"), "a\n\nb");
    }

    #[test]
    fn test_collapses_spaces_and_tabs() {
        assert_eq!(normalize("a  \t  b\t\tc"), "a b c");
    }

    #[test]
    fn test_trims_outer_whitespace() {
        assert_eq!(normalize("  \n\t hello \n "), "hello");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("h\u{00E9}llo", 2), "h\u{00E9}");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
        assert_eq!(char_len("h\u{00E9}llo"), 5);
    }

    /// Printable text interleaved with line endings, tabs and separators.
    fn arb_text() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                "\\PC{0,12}",
                "[\r\n\t \u{0085}\u{2028}\u{2029}]{1,4}",
                Just("\r\n".to_string()),
            ],
            0..16,
        )
        .prop_map(|parts| parts.concat())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_normalize_is_idempotent(input in arb_text()) {
            let once = normalize(&input);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_line_breaks_survive(
            a in "[a-z]{1,8}",
            b in "[a-z]{1,8}",
            sep in "[\r\n\u{0085}\u{2028}\u{2029}]|\r\n",
        ) {
            let out = normalize(&format!("{a}{sep}{b}"));
            prop_assert_eq!(out, format!("{a}\n{b}"));
        }

        #[test]
        fn prop_output_is_ascii_text(input in arb_text()) {
            let out = normalize(&input);
            prop_assert!(out.chars().all(|c| c == '\n' || c.is_ascii_graphic() || c == ' '));
            prop_assert!(!out.contains("  "));
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}
