//! Prompt Assembler.

use super::types::RetrievedChunk;

const NO_CONTEXT: &str = "(no relevant documents were found)";

const INSTRUCTION: &str = "Please answer the user's question based only on the documents provided. \
If the documents do not contain enough information to answer, say that you cannot answer \
the question from the available documentation.";

/// Builds the generation prompt from the literal query and the retrieved
/// passages. Pure: the same inputs always give the same prompt.
pub fn assemble(query: &str, chunks: &[RetrievedChunk]) -> String {
    let documents = if chunks.is_empty() {
        NO_CONTEXT.to_string()
    } else {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| format!("[{}] {}", i + 1, chunk.text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "User question: {}\n\nRelevant documents:\n{}\n\n{}",
        query, documents, INSTRUCTION
    )
}
