//! Splitting a manual text export into page-tagged chunks.
//!
//! Pages are separated by form feeds, the `pdftotext` convention. Chunk boundaries count
//! characters, not bytes, and prefer whitespace near the end of the window.

/// Characters per chunk.
pub const CHUNK_SIZE: usize = 1000;

/// Characters shared by consecutive chunks of the same page.
pub const CHUNK_OVERLAP: usize = 200;

const PAGE_BREAK: char = '\u{c}';

/// One piece of the manual with its 1-based page number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManualChunk {
    pub page: usize,
    pub text: String,
}

/// Splits `text` into non-empty pages, numbered from 1 in document order.
pub fn split_pages(text: &str) -> Vec<(usize, &str)> {
    text.split(PAGE_BREAK)
        .enumerate()
        .map(|(i, page)| (i + 1, page))
        .filter(|(_, page)| !page.trim().is_empty())
        .collect()
}

/// Splits one page into windows of at most `size` characters overlapping by `overlap`.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = size.max(1);
    let overlap = overlap.min(size - 1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let mut end = (start + size).min(chars.len());
        if end < chars.len() {
            // Back up to the last whitespace in the second half of the window.
            if let Some(ws) = (start + size / 2..end).rev().find(|&i| chars[i].is_whitespace()) {
                end = ws + 1;
            }
        }
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }
    chunks
}

/// Pages then chunks of the whole export, with default size and overlap.
pub fn chunk_manual(text: &str) -> Vec<ManualChunk> {
    split_pages(text)
        .into_iter()
        .flat_map(|(page, body)| {
            chunk_text(body, CHUNK_SIZE, CHUNK_OVERLAP)
                .into_iter()
                .map(move |text| ManualChunk { page, text })
        })
        .collect()
}
