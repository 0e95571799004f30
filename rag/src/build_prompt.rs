use crate::document::Document;
use crate::error::{RagError, Result};
use crate::memory::Turn;

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

pub const DEFAULT_CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question.

Chat History:
{chat_history}
Follow Up Input: {question}
Standalone question:";

const DEFAULT_QA_SYSTEM_TEMPLATE: &str = "Use the following pieces of context to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
----------------
{context}";

pub const DEFAULT_CUSTOM_QA_TEMPLATE: &str = "You answer questions about the documents given below. Use only that material, and say you do not know when it does not contain the answer.

Question: {question}
=========
{context}
=========
Answer in Markdown:";

/// Text with `{name}` placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }

    /// Fail unless every listed variable appears in the template.
    pub fn require(self, vars: &[&str]) -> Result<Self> {
        let missing: Vec<&str> = vars
            .iter()
            .copied()
            .filter(|v| !self.template.contains(&format!("{{{}}}", v)))
            .collect();
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(RagError::Configuration(format!(
                "prompt template is missing {}",
                missing
                    .iter()
                    .map(|v| format!("{{{}}}", v))
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }

    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        // Single pass so substituted values are never rescanned.
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();
        'scan: while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            for (name, value) in vars {
                let key = format!("{{{}}}", name);
                if tail.starts_with(&key) {
                    out.push_str(value);
                    rest = &tail[key.len()..];
                    continue 'scan;
                }
            }
            out.push('{');
            rest = &tail[1..];
        }
        out.push_str(rest);
        out
    }
}

/// How the retrieved context and question are turned into chat messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QaPrompt {
    /// System message carrying the context, user message carrying the question.
    Default,
    /// One user message rendered from a template with `{question}` and `{context}`.
    Custom(PromptTemplate),
}

impl QaPrompt {
    pub fn custom(template: impl Into<String>) -> Result<Self> {
        Ok(QaPrompt::Custom(
            PromptTemplate::new(template).require(&["question", "context"])?,
        ))
    }

    pub fn messages(&self, question: &str, docs: &[Document]) -> Vec<Message> {
        let context = format_context(docs);
        match self {
            QaPrompt::Default => vec![
                Message::system(
                    PromptTemplate::new(DEFAULT_QA_SYSTEM_TEMPLATE)
                        .render(&[("context", context.as_str())]),
                ),
                Message::user(question),
            ],
            QaPrompt::Custom(template) => vec![Message::user(
                template.render(&[("question", question), ("context", context.as_str())]),
            )],
        }
    }
}

pub fn condense_prompt(template: impl Into<String>) -> Result<PromptTemplate> {
    PromptTemplate::new(template).require(&["chat_history", "question"])
}

pub fn format_chat_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("Human: {}\nAssistant: {}", t.question, t.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_context(docs: &[Document]) -> String {
    docs.iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_without_rescanning_values() {
        let t = PromptTemplate::new("Q: {question} / C: {context} / {unknown}");
        let out = t.render(&[("question", "why {context}?"), ("context", "ctx")]);
        assert_eq!(out, "Q: why {context}? / C: ctx / {unknown}");
    }

    #[test]
    fn require_reports_missing_variables() {
        let err = QaPrompt::custom("Only {question} here").unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));
        assert!(err.to_string().contains("{context}"));
        assert!(condense_prompt(DEFAULT_CONDENSE_TEMPLATE).is_ok());
        assert!(condense_prompt("{question}").is_err());
    }

    #[test]
    fn default_prompt_puts_context_in_system_message() {
        let docs = vec![Document::new("alpha", "a.txt"), Document::new("beta", "b.txt")];
        let msgs = QaPrompt::Default.messages("what?", &docs);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, "system");
        assert!(msgs[0].content.ends_with("alpha\n\nbeta"));
        assert_eq!(msgs[1], Message::user("what?"));
    }

    #[test]
    fn custom_prompt_is_a_single_user_message() {
        let docs = vec![Document::new("alpha", "a.txt")];
        let msgs = QaPrompt::custom(DEFAULT_CUSTOM_QA_TEMPLATE)
            .unwrap()
            .messages("what?", &docs);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].role, "user");
        assert!(msgs[0].content.contains("Question: what?\n=========\nalpha\n========="));
    }

    #[test]
    fn history_uses_human_and_assistant_labels() {
        let turns = vec![Turn::new("hi", "hello"), Turn::new("name?", "Bot")];
        assert_eq!(
            format_chat_history(&turns),
            "Human: hi\nAssistant: hello\nHuman: name?\nAssistant: Bot"
        );
        assert_eq!(format_chat_history(&[]), "");
    }
}
