//! Text splitting strategies.
//!
//! A [`Chunker`] is built from validated [`ChunkSettings`] and exposes one
//! operation, [`Chunker::split`]. Strategy selection happens at
//! configuration load; by the time a chunker exists the strategy is known
//! good.
//!
//! `split` may emit empty strings (a text ending in the separator, for
//! instance); the pipeline filters those, keeping each strategy's output
//! faithful to its definition.

use crate::config::{ChunkSettings, ChunkStrategy};

/// Splits one text field into an ordered sequence of substrings.
#[derive(Debug, Clone)]
pub struct Chunker {
    strategy: ChunkStrategy,
    separator: String,
    chunk_len: usize,
}

impl Chunker {
    pub fn new(settings: &ChunkSettings) -> Self {
        Self {
            strategy: settings.strategy,
            separator: settings.separator.clone(),
            chunk_len: settings.chunk_len,
        }
    }

    /// Splits `text` according to the configured strategy, preserving order.
    pub fn split(&self, text: &str) -> Vec<String> {
        match self.strategy {
            ChunkStrategy::Sequence => self.split_sequence(text),
            ChunkStrategy::Constant => self.split_constant(text),
            ChunkStrategy::Recursive => self.split_recursive(text),
        }
    }

    /// Literal split at every separator occurrence; separators are removed.
    fn split_sequence(&self, text: &str) -> Vec<String> {
        text.split(self.separator.as_str())
            .map(str::to_string)
            .collect()
    }

    /// Fixed non-overlapping windows of `chunk_len` characters; the final
    /// window holds the remainder. Windows are counted in characters, not
    /// bytes, so multi-byte text never splits inside a code point.
    fn split_constant(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.chunk_len)
            .map(|window| window.iter().collect())
            .collect()
    }

    /// Separator-first splitting with a target length: segments are split at
    /// separator boundaries, adjacent segments are re-merged greedily while
    /// they fit within `chunk_len`, and any single segment that is still too
    /// long (no separator left to split at) falls back to fixed windows.
    fn split_recursive(&self, text: &str) -> Vec<String> {
        if text.chars().count() <= self.chunk_len {
            return vec![text.to_string()];
        }

        let segments: Vec<&str> = text.split(self.separator.as_str()).collect();
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for segment in segments {
            let segment_len = segment.chars().count();
            if segment_len > self.chunk_len {
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                chunks.extend(self.split_constant(segment));
                continue;
            }

            // +separator when appending to a non-empty chunk
            let joined_len = if current.is_empty() {
                segment_len
            } else {
                current_len + self.separator.chars().count() + segment_len
            };

            if joined_len > self.chunk_len && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current.push_str(segment);
                current_len = segment_len;
            } else {
                if !current.is_empty() {
                    current.push_str(&self.separator);
                }
                current.push_str(segment);
                current_len = joined_len;
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }
}
