//! Text segmentation for page blocks.
//!
//! The workspace API rejects rich-text runs longer than
//! [`MAX_BLOCK_CHARS`] characters, so long artifacts are split into
//! consecutive segments. Splits land on grapheme boundaries where possible
//! and the segments always concatenate back to the input.

use unicode_segmentation::UnicodeSegmentation;

/// Maximum characters of text in one block.
pub const MAX_BLOCK_CHARS: usize = 2000;

/// Splits `text` into segments of at most `max_chars` characters.
///
/// Segments are filled greedily, whole grapheme clusters at a time. A single
/// grapheme longer than `max_chars` is split on `char` boundaries. Empty
/// input yields no segments.
///
/// Invariant: `segment(text, n).concat() == text` and every segment has
/// between 1 and `n` characters.
#[must_use]
pub fn segment(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut segments = Vec::new();
    let mut start = 0;
    let mut len_chars = 0;

    for (offset, grapheme) in text.grapheme_indices(true) {
        let g_chars = grapheme.chars().count();

        if g_chars > max_chars {
            if offset > start {
                segments.push(&text[start..offset]);
            }
            split_oversized(grapheme, max_chars, &mut segments);
            start = offset + grapheme.len();
            len_chars = 0;
            continue;
        }

        if len_chars + g_chars > max_chars {
            segments.push(&text[start..offset]);
            start = offset;
            len_chars = 0;
        }
        len_chars += g_chars;
    }

    if start < text.len() {
        segments.push(&text[start..]);
    }
    segments
}

/// Splits a grapheme cluster that alone exceeds the limit.
fn split_oversized<'a>(grapheme: &'a str, max_chars: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in grapheme.char_indices() {
        if count == max_chars {
            out.push(&grapheme[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < grapheme.len() {
        out.push(&grapheme[start..]);
    }
}
