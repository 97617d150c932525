//! Word-window text chunking
//!
//! Splits extracted document text into fixed-size word windows with overlap
//! for embedding. Purely word-count based, no sentence or paragraph
//! awareness.

use tracing::debug;

/// Configuration for text chunking, in words
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk size in words
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in words; must be < chunk_size
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            chunk_overlap: 40,
        }
    }
}

/// Split text into overlapping word-count windows.
///
/// - Empty input yields no chunks.
/// - Input at or below `chunk_size` words yields a single chunk containing
///   the whole (whitespace-normalized) text.
/// - Otherwise a window of `chunk_size` words slides forward by
///   `chunk_size - chunk_overlap` words per step. The step is clamped to at
///   least one word, so the loop terminates for any configuration.
pub fn chunk_words(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() {
        return Vec::new();
    }

    if words.len() <= config.chunk_size {
        return vec![words.join(" ")];
    }

    let step = config
        .chunk_size
        .saturating_sub(config.chunk_overlap)
        .max(1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + config.chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }

    debug!(
        words = words.len(),
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        overlap = config.chunk_overlap,
        "Text chunked"
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, chunk_overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            chunk_overlap,
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_words("", &ChunkingConfig::default()).is_empty());
        assert!(chunk_words("   \n\t ", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_words("supported   clients with\ndaily living", &config(10, 2));
        assert_eq!(chunks, vec!["supported clients with daily living"]);
    }

    #[test]
    fn test_exact_chunk_size_single_chunk() {
        let text = "one two three four five";
        let chunks = chunk_words(text, &config(5, 2));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_sliding_window_with_overlap() {
        // 10 words, size 4, overlap 2 -> windows start at 0, 2, 4, 6
        let text = "w0 w1 w2 w3 w4 w5 w6 w7 w8 w9";
        let chunks = chunk_words(text, &config(4, 2));
        assert_eq!(
            chunks,
            vec!["w0 w1 w2 w3", "w2 w3 w4 w5", "w4 w5 w6 w7", "w6 w7 w8 w9"]
        );
    }

    #[test]
    fn test_boundaries_advance_strictly_forward() {
        let text = (0..500).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = chunk_words(&text, &config(50, 10));

        let firsts: Vec<&str> = chunks
            .iter()
            .map(|c| c.split_whitespace().next().unwrap())
            .collect();
        for pair in firsts.windows(2) {
            let a: usize = pair[0][1..].parse().unwrap();
            let b: usize = pair[1][1..].parse().unwrap();
            assert!(b > a, "window start did not advance: {} -> {}", a, b);
        }
    }

    #[test]
    fn test_terminates_even_with_degenerate_overlap() {
        // Overlap >= chunk_size is rejected by config validation, but the
        // chunker itself must still make forward progress.
        let text = "a b c d e f g h";
        let chunks = chunk_words(text, &config(3, 3));
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= 8);
    }

    #[test]
    fn test_every_word_appears_in_some_chunk() {
        let text = (0..97).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = chunk_words(&text, &config(20, 5));
        let joined = chunks.join(" ");
        for i in 0..97 {
            assert!(joined.contains(&format!("w{}", i)));
        }
    }
}
