//! Carrier segment estimation.
//!
//! Reporting only: the allocator already targets one segment, so anything
//! above 1 here means the text bypassed allocation (kill switch, fail-open)
//! or the emergency path misbehaved.

use crate::normalize::char_len;

/// Characters that fit in one standalone segment.
pub const SINGLE_SEGMENT_CHARS: usize = 160;

/// Characters that fit in two concatenated segments.
pub const TWO_SEGMENT_CHARS: usize = 306;

/// Per-segment capacity once concatenation headers are paid for.
pub const CONCAT_SEGMENT_CHARS: usize = 153;

/// Number of segments `text` occupies. Always at least 1.
pub fn segment_count(text: &str) -> u32 {
    segments_for_len(char_len(text))
}

pub fn segments_for_len(len: usize) -> u32 {
    let segments = match len {
        0..=SINGLE_SEGMENT_CHARS => 1,
        _ if len <= TWO_SEGMENT_CHARS => 2,
        _ => len.div_ceil(CONCAT_SEGMENT_CHARS),
    };
    u32::try_from(segments).unwrap_or(u32::MAX)
}
