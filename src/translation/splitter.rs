/*!
 * Chunk splitting for engine-safe translation requests.
 *
 * Translation engines reject oversized inputs, so chapter text is cut into
 * ordered chunks before it is sent anywhere. Sentences are accumulated up to
 * a soft limit; anything still above the hard limit afterwards is sliced at
 * fixed positions. Concatenating the chunks in order always gives back the
 * input text.
 */

use crate::app_config::SplitterConfig;
use crate::errors::ChunkOverflow;

/// Sentence delimiter; it stays attached to the sentence it ends
pub const SENTENCE_DELIMITER: &str = ". ";

/// Deterministic, side-effect free text splitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSplitter {
    soft_limit: usize,
    hard_limit: usize,
    slice_size: usize,
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self::new(&SplitterConfig::default())
    }
}

impl ChunkSplitter {
    /// Create a splitter from the configured limits
    pub fn new(config: &SplitterConfig) -> Self {
        Self {
            soft_limit: config.soft_limit.max(1),
            hard_limit: config.hard_limit.max(1),
            slice_size: config.slice_size.clamp(1, config.hard_limit.max(1)),
        }
    }

    /// Soft limit in chars
    pub fn soft_limit(&self) -> usize {
        self.soft_limit
    }

    /// Hard limit in chars
    pub fn hard_limit(&self) -> usize {
        self.hard_limit
    }

    /// Split text into ordered chunks
    ///
    /// Empty or whitespace-only input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in text.split_inclusive(SENTENCE_DELIMITER) {
            let sentence_len = sentence.chars().count();
            if !current.is_empty() && current_len + sentence_len > self.soft_limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(sentence);
            current_len += sentence_len;
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
            .into_iter()
            .flat_map(|chunk| {
                if chunk.chars().count() > self.hard_limit {
                    self.hard_slice(&chunk)
                } else {
                    vec![chunk]
                }
            })
            .collect()
    }

    /// Cut text into fixed-size slices, ignoring sentence boundaries
    pub fn hard_slice(&self, text: &str) -> Vec<String> {
        let mut slices = Vec::new();
        let mut start = 0usize;
        let mut count = 0usize;

        for (offset, _) in text.char_indices() {
            if count == self.slice_size {
                slices.push(text[start..offset].to_string());
                start = offset;
                count = 0;
            }
            count += 1;
        }

        if start < text.len() {
            slices.push(text[start..].to_string());
        }

        slices
    }

    /// Check that a chunk may be handed to an engine
    pub fn check_hard_limit(&self, chunk: &str) -> Result<(), ChunkOverflow> {
        let length = chunk.chars().count();
        if length > self.hard_limit {
            return Err(ChunkOverflow {
                length,
                limit: self.hard_limit,
            });
        }
        Ok(())
    }
}
