//! Deterministic text chunking with overlap.
//!
//! Text is cut into segments of at most `chunk_size` characters. Each cut
//! point is searched backwards from the size limit, preferring paragraph
//! breaks, then line breaks, then sentence ends, then whitespace, falling
//! back to a hard cut. Consecutive segments overlap by `chunk_overlap`
//! characters to preserve context across boundaries.
use crate::ingest::loader::Document;
use crate::store::Chunk;

/// Split text into overlapping segments of at most `chunk_size` chars
/// (`char` count, not bytes).
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= chunk_size {
        return vec![trimmed.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        if chars.len() - start <= chunk_size {
            let piece: String = chars[start..].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }
            break;
        }

        let cut = find_cut_point(&chars, start, start + chunk_size);
        let piece: String = chars[start..cut].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        // Rewind by the overlap, unless that would stall the window
        let next = cut.saturating_sub(chunk_overlap);
        start = if next > start { next } else { cut };
    }

    chunks
}

/// Find the best cut index in `(start, limit]`, searching backwards from
/// `limit` down to the window midpoint.
fn find_cut_point(chars: &[char], start: usize, limit: usize) -> usize {
    let min = start + (limit - start) / 2;

    // Paragraph break
    for i in (min..limit).rev() {
        if i > start && chars[i] == '\n' && chars[i - 1] == '\n' {
            return i + 1;
        }
    }
    // Line break
    for i in (min..limit).rev() {
        if chars[i] == '\n' {
            return i + 1;
        }
    }
    // Sentence end followed by whitespace
    for i in (min..limit).rev() {
        if matches!(chars[i], '.' | '!' | '?' | '。') && chars[i + 1].is_whitespace() {
            return i + 1;
        }
    }
    // Any whitespace
    for i in (min..limit).rev() {
        if chars[i].is_whitespace() {
            return i + 1;
        }
    }

    limit
}

/// Split a loaded document into [`Chunk`]s with index and total metadata.
pub fn split_document(doc: &Document, chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    let pieces = split_text(&doc.content, chunk_size, chunk_overlap);
    let total_chunks = pieces.len();

    pieces
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| Chunk {
            content,
            source: doc.source.clone(),
            chunk_index,
            total_chunks,
        })
        .collect()
}
