//! Context budgeting for retrieved passages

use tracing::debug;

use super::prompts::format_passage;
use crate::config::ContextConfig;
use crate::retrieval::RetrievedPassage;

/// Separator between passage blocks in the prompt
const BLOCK_SEPARATOR_CHARS: usize = 2;

/// Fits retrieved passages into a character budget
///
/// Passages are taken in retrieval order. The first one that does not fit is
/// truncated when enough room is left for `min_chunk_chars` of its text, and
/// everything after it is dropped. The first passage is always kept.
pub struct ContextAssembler {
    max_context_chars: usize,
    min_chunk_chars: usize,
}

impl ContextAssembler {
    /// Create a new context assembler
    #[must_use]
    pub const fn new(max_context_chars: usize, min_chunk_chars: usize) -> Self {
        Self {
            max_context_chars,
            min_chunk_chars,
        }
    }

    pub const fn from_config(config: &ContextConfig) -> Self {
        Self::new(config.max_context_chars, config.min_chunk_chars)
    }

    /// Return the passages that fit, in their original order
    #[must_use]
    pub fn fit(&self, passages: &[RetrievedPassage]) -> Vec<RetrievedPassage> {
        let mut kept: Vec<RetrievedPassage> = Vec::with_capacity(passages.len());
        let mut used = 0;

        for passage in passages {
            let separator = if kept.is_empty() { 0 } else { BLOCK_SEPARATOR_CHARS };
            let block_chars = format_passage(passage).chars().count();

            if used + separator + block_chars <= self.max_context_chars {
                kept.push(passage.clone());
                used += separator + block_chars;
                continue;
            }

            if let Some(truncated) = self.truncate(passage, used + separator, kept.is_empty()) {
                kept.push(truncated);
            }
            break;
        }

        if kept.len() < passages.len() || kept.iter().zip(passages).any(|(k, p)| k != p) {
            debug!(
                "Context budget {} chars: kept {} of {} passages",
                self.max_context_chars,
                kept.len(),
                passages.len()
            );
        }

        kept
    }

    fn truncate(
        &self,
        passage: &RetrievedPassage,
        used: usize,
        is_first: bool,
    ) -> Option<RetrievedPassage> {
        let Some(text) = passage.text.as_deref() else {
            // Placeholder text is short; keep the first block whole, drop the rest
            return is_first.then(|| passage.clone());
        };

        let text_chars = text.chars().count();
        let header_chars = format_passage(passage).chars().count() - text_chars;
        let remaining = self.max_context_chars.saturating_sub(used);
        // truncate_str appends "..."
        let text_room = remaining.saturating_sub(header_chars + 3);

        if !is_first && text_room < self.min_chunk_chars {
            return None;
        }

        let mut truncated = passage.clone();
        truncated.text = Some(truncate_str(text, text_room));
        Some(truncated)
    }
}

/// Safely truncate a string at character boundary (not byte boundary)
///
/// This prevents panics when truncating strings with multi-byte UTF-8 characters (emojis, etc.)
///
/// # Arguments
/// * `s` - The string to truncate
/// * `max_chars` - Maximum number of characters (not bytes)
///
/// # Returns
/// Truncated string with "..." suffix if truncated, otherwise the original string
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::from_config(&ContextConfig::default())
    }
}
