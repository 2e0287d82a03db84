//! Event tag generation.
//!
//! Every message is prefixed with a short bracketed tag so recipients can tell
//! which event it concerns. A host-assigned `sms_tag` wins; otherwise the tag
//! is abbreviated from the event title.

use unicode_normalization::UnicodeNormalization;

use crate::normalize::truncate_chars;

/// Maximum tag length in characters (the header adds two brackets).
pub const MAX_TAG_CHARS: usize = 14;

/// Tag used when the title yields no usable words.
pub const FALLBACK_TAG: &str = "Event";

const ABBREVIATION_CHARS: usize = 3;

/// Compute the effective tag for an event.
///
/// The word set is fixed before truncation; truncation only cuts the
/// assembled string and never leaves a dangling `+`.
pub fn event_tag(sms_tag: Option<&str>, title: &str) -> String {
    if let Some(explicit) = sms_tag.map(fold_explicit_tag).filter(|t| !t.is_empty()) {
        return truncate_chars(&explicit, MAX_TAG_CHARS).trim_end().to_string();
    }
    abbreviate_title(title)
}

/// Header line for a tag: `[tag]`.
pub fn header_for(tag: &str) -> String {
    format!("[{tag}]")
}

fn fold_explicit_tag(tag: &str) -> String {
    tag.nfkd()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && !matches!(*c, '[' | ']'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn abbreviate_title(title: &str) -> String {
    let words = title_words(title);
    let assembled = match words.split_first() {
        None => return FALLBACK_TAG.to_string(),
        Some((first, [])) => first.clone(),
        Some((first, rest)) => {
            let mut tag = first.clone();
            for word in rest {
                tag.push('+');
                tag.extend(word.chars().take(ABBREVIATION_CHARS));
            }
            tag
        }
    };

    let tag = truncate_chars(&assembled, MAX_TAG_CHARS).trim_end_matches('+');
    if tag.is_empty() {
        FALLBACK_TAG.to_string()
    } else {
        tag.to_string()
    }
}

/// ASCII-folded words of a title. Possessive `'s` is dropped so
/// "Grant's" contributes "Grant".
fn title_words(title: &str) -> Vec<String> {
    title
        .split_whitespace()
        .map(strip_possessive)
        .map(|word| {
            word.nfkd()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '+')
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect()
}

fn strip_possessive(word: &str) -> &str {
    let word = word.trim_end_matches(|c: char| !c.is_alphanumeric());
    for suffix in ["'s", "'S", "\u{2019}s", "\u{2019}S"] {
        if let Some(stem) = word.strip_suffix(suffix) {
            if !stem.is_empty() {
                return stem;
            }
        }
    }
    word
}
