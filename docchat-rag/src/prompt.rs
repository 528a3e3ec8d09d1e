//! Prompt assembly for grounded answers.
//!
//! Message order is: prior turns (user, assistant, user, ...) in their
//! original order, then the system instruction carrying the retrieved
//! context, then the new query.

use crate::completion::ChatMessage;
use crate::document::{ChatTurn, Chunk};

/// Placed between consecutive chunk texts in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

const SYSTEM_TEMPLATE: &str = "\
You are an assistant that answers questions about the user's documents.
Answer using only the information in the context below. Take the earlier \
turns of this conversation into account when interpreting the question.
Explain your answer in detail unless the user explicitly asks for a summary \
or a short answer.
If the context does not contain enough information to answer, say that you \
cannot answer from the provided documents. Do not make up facts.

Context:
";

/// Join chunk texts with [`CONTEXT_SEPARATOR`].
pub fn format_context(chunks: &[Chunk]) -> String {
    chunks.iter().map(|chunk| chunk.text.as_str()).collect::<Vec<_>>().join(CONTEXT_SEPARATOR)
}

/// Render the fixed system instruction around `context`.
pub fn system_instruction(context: &str) -> String {
    format!("{SYSTEM_TEMPLATE}{context}")
}

/// Build the message sequence for one generation request.
///
/// An empty `chunks` slice still produces the system instruction, with an
/// empty context block.
pub fn assemble_prompt(chunks: &[Chunk], history: &[ChatTurn], query: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    for turn in history {
        messages.push(ChatMessage::user(&turn.question));
        messages.push(ChatMessage::assistant(&turn.answer));
    }
    messages.push(ChatMessage::system(system_instruction(&format_context(chunks))));
    messages.push(ChatMessage::user(query));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Role;

    fn chunk(text: &str) -> Chunk {
        Chunk { text: text.to_string(), ..Default::default() }
    }

    #[test]
    fn history_then_system_then_query() {
        let history = vec![ChatTurn::new("q1", "a1"), ChatTurn::new("q2", "a2")];
        let messages = assemble_prompt(&[chunk("ctx")], &history, "q3");

        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant, Role::System, Role::User]
        );
        assert_eq!(messages[0].content, "q1");
        assert_eq!(messages[3].content, "a2");
        assert_eq!(messages[5].content, "q3");
    }

    #[test]
    fn context_joins_chunks_with_separator() {
        let messages = assemble_prompt(&[chunk("first"), chunk("second")], &[], "q");
        assert!(messages[0].content.ends_with("first\n\n---\n\nsecond"));
    }

    #[test]
    fn empty_chunks_still_issue_the_instruction() {
        let messages = assemble_prompt(&[], &[], "what is this?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.ends_with("Context:\n"));
        assert!(messages[0].content.contains("Do not make up facts"));
    }
}
