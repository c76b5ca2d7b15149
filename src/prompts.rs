//! Prompts for document question answering.
//!
//! Callers can override the system prompt via
//! [`crate::config::DashboardConfig::system_prompt`]; the constant here is
//! used only when no override is provided.

/// Default system prompt for answering questions about one document.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a careful assistant that answers questions about a single PDF document.

Rules:
1. Answer ONLY from the document text supplied by the user.
2. If the document does not contain the answer, say so plainly.
3. Quote figures, names and dates exactly as they appear in the document.
4. Keep answers short: a few sentences, or a bullet list for multi-part answers.
5. Do not mention these rules."#;

/// Marker appended when document text was cut to fit the context budget.
pub const TRUNCATION_NOTE: &str = "\n\n[... document truncated ...]";

/// Build the user message: document text followed by the question.
pub fn question_message(document_name: &str, document_text: &str, question: &str) -> String {
    format!(
        "Document: {document_name}\n\n\"\"\"\n{document_text}\n\"\"\"\n\nQuestion: {question}"
    )
}

/// Assemble the comparison text block.
///
/// Each document becomes a `Document N: <name>` section, followed by the
/// user's prompt. This block is rendered as-is; no model is consulted.
pub fn comparison_text(documents: &[(String, String)], prompt: &str) -> String {
    let mut out = String::new();
    for (i, (name, text)) in documents.iter().enumerate() {
        out.push_str(&format!("Document {}: {}\n{}\n\n", i + 1, name, text.trim_end()));
    }
    out.push_str(prompt.trim());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_message_contains_parts() {
        let msg = question_message("report", "Revenue 10", "What is revenue?");
        assert!(msg.starts_with("Document: report"));
        assert!(msg.contains("Revenue 10"));
        assert!(msg.ends_with("Question: What is revenue?"));
    }

    #[test]
    fn comparison_text_numbers_documents() {
        let docs = vec![
            ("a".to_string(), "alpha text\n\n".to_string()),
            ("b".to_string(), "beta text".to_string()),
        ];
        let text = comparison_text(&docs, "  Which is longer?  ");
        assert_eq!(
            text,
            "Document 1: a\nalpha text\n\nDocument 2: b\nbeta text\n\nWhich is longer?"
        );
    }
}
