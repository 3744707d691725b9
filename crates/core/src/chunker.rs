//! Splits long text into API-size-bounded segments at natural boundaries.
//!
//! The limit is a character budget, and input regularly mixes Latin and
//! Indic scripts, so all indexing here is in characters rather than
//! bytes.

/// Sentence terminators recognized as preferred cut points. Includes the
/// Devanagari danda used across Indic scripts.
pub const SENTENCE_TERMINATORS: [char; 4] = ['.', '!', '?', '।'];

/// Split `text` into trimmed, non-empty segments of at most
/// `max_chunk_size` characters.
///
/// Cut points are searched backward from the limit toward half the
/// limit: first a sentence terminator followed by whitespace, then a
/// comma or bare whitespace, and as a last resort a hard cut exactly at
/// the limit. Joining the segments back together with single spaces
/// preserves every word of the input in order.
pub fn split_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || max_chunk_size == 0 {
        return Vec::new();
    }

    let mut remaining: Vec<char> = trimmed.chars().collect();
    if remaining.len() <= max_chunk_size {
        return vec![trimmed.to_owned()];
    }

    let mut chunks = Vec::new();
    while !remaining.is_empty() {
        if remaining.len() <= max_chunk_size {
            push_trimmed(&mut chunks, &remaining);
            break;
        }

        let cut = find_cut_point(&remaining, max_chunk_size);
        push_trimmed(&mut chunks, &remaining[..cut]);
        remaining = trim_leading(&remaining[cut..]);
    }

    chunks
}

/// Best cut index in `(max/2, max]`, preferring sentence boundaries.
fn find_cut_point(chars: &[char], max_chunk_size: usize) -> usize {
    let floor = max_chunk_size / 2;

    for i in (floor + 1..max_chunk_size).rev() {
        if SENTENCE_TERMINATORS.contains(&chars[i]) && chars[i + 1].is_whitespace() {
            return i + 1;
        }
    }

    for i in (floor + 1..max_chunk_size).rev() {
        if chars[i] == ',' || chars[i].is_whitespace() {
            return i + 1;
        }
    }

    max_chunk_size
}

fn push_trimmed(chunks: &mut Vec<String>, chars: &[char]) {
    let segment: String = chars.iter().collect::<String>().trim().to_owned();
    if !segment.is_empty() {
        chunks.push(segment);
    }
}

fn trim_leading(chars: &[char]) -> Vec<char> {
    chars
        .iter()
        .skip_while(|c| c.is_whitespace())
        .copied()
        .collect()
}
