//! Length-budget allocation for single-segment messages.
//!
//! The allocator assembles `header \n body[ link] \n\n brand \n notice` and,
//! when that does not fit the segment budget, degrades through an ordered
//! list of tiers. The first tier whose rendered text fits wins:
//!
//! 1. `Full`: everything
//! 2. `DropLink`: link removed
//! 3. `DropBrand`: link and brand removed, notice kept
//! 4. `TruncateBody`: body cut to the remaining space plus an ellipsis,
//!    notice kept, as long as at least `min_body_chars` of body remain
//! 5. `Emergency`: header and as much body as fits; brand and notice are
//!    dropped even if owed
//!
//! All checks run against the rendered string so separators are counted.
//! Allocation is pure and cannot fail.

use std::borrow::Cow;

use serde::Serialize;
use tracing::trace;

use crate::normalize::{char_len, truncate_chars};

/// Characters in a single GSM-7 segment.
pub const SEGMENT_BUDGET: usize = 160;

/// Longest possible header: `[` + 14-char tag + `]`.
pub const MAX_HEADER_CHARS: usize = crate::tag::MAX_TAG_CHARS + 2;

/// Minimum body characters tier 4 must be able to keep.
pub const MIN_BODY_CHARS: usize = 10;

/// Single-character marker appended to a truncated body.
///
/// U+2026 is outside the GSM-7 basic set, so a truncated message goes out
/// UCS-2 encoded on carriers that honour the alphabet strictly. It costs one
/// character here and is never produced by [`normalize`](crate::normalize::normalize), which folds
/// it to `...`, so its presence in the output always means the composer cut
/// the body.
pub const ELLIPSIS: &str = "\u{2026}";

const HEADER_SEPARATOR: &str = "\n";
const FOOTER_SEPARATOR: &str = "\n\n";
const FOOTER_LINE_SEPARATOR: &str = "\n";

/// Degradation tier that produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Full,
    DropLink,
    DropBrand,
    TruncateBody,
    Emergency,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Full => "full",
            Tier::DropLink => "drop_link",
            Tier::DropBrand => "drop_brand",
            Tier::TruncateBody => "truncate_body",
            Tier::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pre-built text parts. `brand` is only ever rendered alongside `notice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Components<'a> {
    pub header: &'a str,
    pub body: &'a str,
    pub link: Option<&'a str>,
    pub brand: Option<&'a str>,
    pub notice: Option<&'a str>,
}

impl<'a> Components<'a> {
    /// Brand line as it would be rendered: present only with the notice.
    fn effective_brand(&self) -> Option<&'a str> {
        self.notice.and(self.brand)
    }
}

/// Outcome of an allocation. The flags are read off the layout that
/// produced `text` and cannot be set independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    text: String,
    tier: Tier,
    included_notice: bool,
    included_brand: bool,
    dropped_link: bool,
    truncated_body: bool,
}

impl Allocation {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn included_notice(&self) -> bool {
        self.included_notice
    }

    pub fn included_brand(&self) -> bool {
        self.included_brand
    }

    pub fn dropped_link(&self) -> bool {
        self.dropped_link
    }

    pub fn truncated_body(&self) -> bool {
        self.truncated_body
    }

    /// True when the emergency tier could not keep any body at all.
    pub fn is_header_only(&self, components: &Components<'_>) -> bool {
        self.text == components.header
    }
}

/// What a tier chose to keep.
struct Layout<'a> {
    header: &'a str,
    body: Cow<'a, str>,
    link: Option<&'a str>,
    brand: Option<&'a str>,
    notice: Option<&'a str>,
    truncated: bool,
}

impl<'a> Layout<'a> {
    fn render(&self) -> String {
        let mut main = self.body.to_string();
        if let Some(link) = self.link {
            if !main.is_empty() {
                main.push(' ');
            }
            main.push_str(link);
        }

        let mut text = self.header.to_string();
        if !main.is_empty() {
            text.push_str(HEADER_SEPARATOR);
            text.push_str(&main);
        }

        let footer: Vec<&str> = [self.brand, self.notice].into_iter().flatten().collect();
        if !footer.is_empty() {
            text.push_str(FOOTER_SEPARATOR);
            text.push_str(&footer.join(FOOTER_LINE_SEPARATOR));
        }
        text
    }

    fn into_allocation(self, tier: Tier, components: &Components<'_>, text: String) -> Allocation {
        Allocation {
            text,
            tier,
            included_notice: self.notice.is_some(),
            included_brand: self.brand.is_some(),
            dropped_link: components.link.is_some() && self.link.is_none(),
            truncated_body: self.truncated,
        }
    }
}

type TierFn = for<'a> fn(&BudgetAllocator, &Components<'a>) -> Option<Allocation>;

/// Tiers tried in order; `Emergency` follows as the infallible fallback.
const TIERS: [(Tier, TierFn); 4] = [
    (Tier::Full, BudgetAllocator::full),
    (Tier::DropLink, BudgetAllocator::drop_link),
    (Tier::DropBrand, BudgetAllocator::drop_brand),
    (Tier::TruncateBody, BudgetAllocator::truncate_body),
];

/// Fits message components into a fixed character budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetAllocator {
    budget: usize,
    min_body_chars: usize,
    ellipsis: String,
}

impl Default for BudgetAllocator {
    fn default() -> Self {
        Self::new(SEGMENT_BUDGET, MIN_BODY_CHARS, ELLIPSIS)
    }
}

impl BudgetAllocator {
    pub fn new(budget: usize, min_body_chars: usize, ellipsis: impl Into<String>) -> Self {
        Self {
            budget,
            min_body_chars,
            ellipsis: ellipsis.into(),
        }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Run the tiers in order and return the first fit.
    pub fn allocate(&self, components: &Components<'_>) -> Allocation {
        TIERS
            .iter()
            .find_map(|(tier, attempt)| {
                let fitted = attempt(self, components);
                if fitted.is_none() {
                    trace!(tier = tier.as_str(), "tier did not fit");
                }
                fitted
            })
            .unwrap_or_else(|| self.emergency(components))
    }

    /// Body characters left for tier 4 once header, separators, notice and
    /// ellipsis are paid for.
    pub fn truncation_space(&self, header: &str, notice: Option<&str>) -> Option<usize> {
        let footer = notice.map_or(0, |n| char_len(FOOTER_SEPARATOR) + char_len(n));
        self.budget
            .checked_sub(char_len(header))?
            .checked_sub(char_len(HEADER_SEPARATOR))?
            .checked_sub(footer)?
            .checked_sub(char_len(&self.ellipsis))
    }

    fn fit(
        &self,
        tier: Tier,
        components: &Components<'_>,
        layout: Layout<'_>,
    ) -> Option<Allocation> {
        let text = layout.render();
        if char_len(&text) <= self.budget {
            Some(layout.into_allocation(tier, components, text))
        } else {
            None
        }
    }

    fn full(&self, c: &Components<'_>) -> Option<Allocation> {
        let layout = Layout {
            header: c.header,
            body: Cow::Borrowed(c.body),
            link: c.link,
            brand: c.effective_brand(),
            notice: c.notice,
            truncated: false,
        };
        self.fit(Tier::Full, c, layout)
    }

    fn drop_link(&self, c: &Components<'_>) -> Option<Allocation> {
        c.link?;
        let layout = Layout {
            header: c.header,
            body: Cow::Borrowed(c.body),
            link: None,
            brand: c.effective_brand(),
            notice: c.notice,
            truncated: false,
        };
        self.fit(Tier::DropLink, c, layout)
    }

    fn drop_brand(&self, c: &Components<'_>) -> Option<Allocation> {
        c.effective_brand()?;
        let layout = Layout {
            header: c.header,
            body: Cow::Borrowed(c.body),
            link: None,
            brand: None,
            notice: c.notice,
            truncated: false,
        };
        self.fit(Tier::DropBrand, c, layout)
    }

    fn truncate_body(&self, c: &Components<'_>) -> Option<Allocation> {
        let space = self.truncation_space(c.header, c.notice)?;
        if space < self.min_body_chars {
            return None;
        }
        let layout = Layout {
            header: c.header,
            body: Cow::Owned(self.cut(c.body, space)),
            link: None,
            brand: None,
            notice: c.notice,
            truncated: true,
        };
        self.fit(Tier::TruncateBody, c, layout)
    }

    fn emergency(&self, c: &Components<'_>) -> Allocation {
        let whole_body = self
            .budget
            .saturating_sub(char_len(c.header) + char_len(HEADER_SEPARATOR));
        let (body, truncated) = if char_len(c.body) <= whole_body {
            (Cow::Borrowed(c.body), false)
        } else {
            match self.truncation_space(c.header, None) {
                Some(space) if space > 0 => (Cow::Owned(self.cut(c.body, space)), true),
                _ => (Cow::Borrowed(""), !c.body.is_empty()),
            }
        };
        let layout = Layout {
            header: c.header,
            body,
            link: None,
            brand: None,
            notice: None,
            truncated,
        };
        let text = layout.render();
        layout.into_allocation(Tier::Emergency, c, text)
    }

    /// Body cut to `space` characters, trailing whitespace removed, ellipsis
    /// appended.
    fn cut(&self, body: &str, space: usize) -> String {
        let mut cut = truncate_chars(body, space).trim_end().to_string();
        cut.push_str(&self.ellipsis);
        cut
    }
}
