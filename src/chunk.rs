//! Recursive character text splitter.
//!
//! Splits document body text into [`Chunk`]s of at most `chunk_size`
//! characters. Text is broken on paragraph boundaries (`\n\n`) first, then
//! lines, then words; only a single word longer than the limit is cut
//! mid-token. The resulting pieces are merged greedily back into chunks,
//! each new chunk re-using up to `chunk_overlap` characters from the tail
//! of the previous one.
//!
//! Lengths are counted in `char`s so a split never lands inside a UTF-8
//! sequence. Each chunk gets a UUID plus a SHA-256 hash of its text.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::models::Chunk;

/// Separators tried in order, coarsest first.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A piece of text no longer than the chunk size, with the separator that
/// joins it to the piece before it.
#[derive(Debug)]
struct Piece<'a> {
    text: &'a str,
    sep: &'static str,
}

/// Split text into chunks with contiguous indices starting at 0.
///
/// Blank text produces no chunks.
pub fn chunk_text(document_id: &str, text: &str, config: &ChunkingConfig) -> Vec<Chunk> {
    let max = config.chunk_size.max(1);
    let mut pieces = Vec::new();
    split_pieces(text, 0, max, "", &mut pieces);

    merge_pieces(&pieces, max, config.chunk_overlap)
        .iter()
        .enumerate()
        .map(|(i, t)| make_chunk(document_id, i as i64, t))
        .collect()
}

fn split_pieces<'a>(
    text: &'a str,
    level: usize,
    max: usize,
    sep_before: &'static str,
    out: &mut Vec<Piece<'a>>,
) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }

    if char_len(trimmed) <= max {
        out.push(Piece {
            text: trimmed,
            sep: sep_before,
        });
        return;
    }

    if level == SEPARATORS.len() {
        for (i, part) in hard_split(trimmed, max).into_iter().enumerate() {
            out.push(Piece {
                text: part,
                sep: if i == 0 { sep_before } else { "" },
            });
        }
        return;
    }

    let sep = SEPARATORS[level];
    let mut first = true;
    for part in trimmed.split(sep) {
        if part.trim().is_empty() {
            continue;
        }
        split_pieces(part, level + 1, max, if first { sep_before } else { sep }, out);
        first = false;
    }
}

/// Cut text into slices of exactly `max` chars (the last may be shorter).
fn hard_split(text: &str, max: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == max {
            parts.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

fn merge_pieces(pieces: &[Piece<'_>], max: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: Vec<&Piece<'_>> = Vec::new();

    for piece in pieces {
        if !window.is_empty() && joined_len(&window, Some(piece)) > max {
            chunks.push(join(&window));

            // Keep only a tail short enough to overlap and still fit the next piece.
            while !window.is_empty()
                && (joined_len(&window, None) > overlap || joined_len(&window, Some(piece)) > max)
            {
                window.remove(0);
            }
        }
        window.push(piece);
    }

    if !window.is_empty() {
        chunks.push(join(&window));
    }

    chunks
}

fn joined_len(window: &[&Piece<'_>], next: Option<&Piece<'_>>) -> usize {
    let mut len = 0;
    for (i, piece) in window.iter().chain(next.as_ref()).enumerate() {
        if i > 0 {
            len += char_len(piece.sep);
        }
        len += char_len(piece.text);
    }
    len
}

fn join(window: &[&Piece<'_>]) -> String {
    let mut out = String::new();
    for (i, piece) in window.iter().enumerate() {
        if i > 0 {
            out.push_str(piece.sep);
        }
        out.push_str(piece.text);
    }
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn make_chunk(document_id: &str, index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}
