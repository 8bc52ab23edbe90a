//! Prompt composition for persona RAG queries

use super::NO_CONTEXT_ANSWER;
use crate::llm::PERSONA_NAME;
use crate::retrieval::RetrievedPassage;

const UNKNOWN_SOURCE: &str = "Unknown";
const MISSING_TEXT: &str = "[No text available]";

/// Result of composing a question with its retrieved passages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composition {
    /// Prompt ready for the answer generator
    Prompt(String),
    /// Nothing was retrieved; answer with [`NO_CONTEXT_ANSWER`] and skip generation
    Fallback,
}

impl Composition {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Prompt(prompt) => prompt,
            Self::Fallback => NO_CONTEXT_ANSWER,
        }
    }
}

/// Merge passages and the question into one instruction
pub fn compose(question: &str, passages: &[RetrievedPassage]) -> Composition {
    if passages.is_empty() {
        return Composition::Fallback;
    }

    let context = passages
        .iter()
        .map(format_passage)
        .collect::<Vec<_>>()
        .join("\n\n");

    Composition::Prompt(build_persona_rag_prompt(question, &context))
}

/// Render one passage as a `Source:` / `Chunk:` block
pub fn format_passage(passage: &RetrievedPassage) -> String {
    format!(
        "Source: {}\nChunk: {}",
        passage.source_id.as_deref().unwrap_or(UNKNOWN_SOURCE),
        passage.text.as_deref().unwrap_or(MISSING_TEXT)
    )
}

/// Build persona RAG prompt
pub fn build_persona_rag_prompt(question: &str, context: &str) -> String {
    format!(
        r"Use the following retrieved information to answer the question as if you are {PERSONA_NAME}.

Retrieved Information:
{context}

Question: {question}
Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(source: Option<&str>, text: Option<&str>, score: f32) -> RetrievedPassage {
        RetrievedPassage::new("id", source, text, score)
    }

    #[test]
    fn test_empty_passages_fall_back() {
        let composed = compose("anything at all", &[]);
        assert_eq!(composed, Composition::Fallback);
        assert_eq!(composed.as_str(), "I couldn't find relevant information.");
    }

    #[test]
    fn test_blocks_in_input_order() {
        let passages: Vec<RetrievedPassage> = (0..4)
            .map(|i| {
                passage(
                    Some(&format!("doc{i}.md")),
                    Some(&format!("chunk number {i}")),
                    1.0 - i as f32 / 10.0,
                )
            })
            .collect();

        let composed = compose("q?", &passages);
        let prompt = composed.as_str();

        assert_eq!(prompt.matches("Source: ").count(), 4);
        assert_eq!(prompt.matches("Chunk: ").count(), 4);

        let positions: Vec<usize> = (0..4)
            .map(|i| prompt.find(&format!("Chunk: chunk number {i}")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_metadata_placeholders() {
        let composed = compose("q", &[passage(None, None, 0.5)]);
        assert!(composed.as_str().contains("Source: Unknown\nChunk: [No text available]"));
    }

    #[test]
    fn test_blocks_separated_by_blank_line() {
        let composed = compose(
            "q",
            &[
                passage(Some("a"), Some("one"), 0.9),
                passage(Some("b"), Some("two"), 0.8),
            ],
        );
        assert!(composed
            .as_str()
            .contains("Source: a\nChunk: one\n\nSource: b\nChunk: two\n\nQuestion: q\nAnswer:"));
    }

    #[test]
    fn test_prompt_template() {
        let prompt = build_persona_rag_prompt("Why Rust?", "Source: x\nChunk: y");
        assert!(prompt.starts_with(
            "Use the following retrieved information to answer the question as if you are Dominic."
        ));
        assert!(prompt.contains("Retrieved Information:\nSource: x"));
        assert!(prompt.ends_with("Question: Why Rust?\nAnswer:"));
    }
}
