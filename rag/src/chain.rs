use std::sync::Arc;

use crate::build_prompt::{format_chat_history, Message, PromptTemplate, QaPrompt};
use crate::document::Document;
use crate::error::Result;
use crate::generate::ChatModel;
use crate::memory::{ConversationMemory, Turn};
use crate::retrieve_chunks::Retriever;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainInput {
    pub question: String,
    /// Explicit history, used only by chains without their own memory.
    pub chat_history: Option<Vec<Turn>>,
}

impl ChainInput {
    pub fn question(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            chat_history: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainOutput {
    pub answer: String,
    pub source_documents: Vec<Document>,
}

/// Something that answers a question, possibly remembering earlier turns.
pub trait Chain {
    fn call(&mut self, input: ChainInput) -> Result<ChainOutput>;

    /// The chain's own conversation memory, if it keeps one.
    fn memory(&self) -> Option<&ConversationMemory> {
        None
    }
}

/// Condense the question against the history, retrieve, then answer over
/// the retrieved documents.
pub struct ConversationalRetrievalChain {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn ChatModel>,
    qa_prompt: QaPrompt,
    condense_prompt: PromptTemplate,
    memory: Option<ConversationMemory>,
    return_source_documents: bool,
}

impl ConversationalRetrievalChain {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn ChatModel>,
        qa_prompt: QaPrompt,
        condense_prompt: PromptTemplate,
    ) -> Self {
        Self {
            retriever,
            llm,
            qa_prompt,
            condense_prompt,
            memory: None,
            return_source_documents: false,
        }
    }

    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn return_source_documents(mut self, yes: bool) -> Self {
        self.return_source_documents = yes;
        self
    }

    fn standalone_question(&self, question: &str, history: &[Turn]) -> Result<String> {
        if history.is_empty() {
            return Ok(question.to_string());
        }
        let chat_history = format_chat_history(history);
        let prompt = self
            .condense_prompt
            .render(&[("chat_history", chat_history.as_str()), ("question", question)]);
        let rephrased = self.llm.complete(&[Message::user(prompt)])?;
        tracing::debug!(question, rephrased = %rephrased, "condensed question");
        Ok(rephrased.trim().to_string())
    }
}

impl Chain for ConversationalRetrievalChain {
    fn call(&mut self, input: ChainInput) -> Result<ChainOutput> {
        let standalone = {
            let history: &[Turn] = match &self.memory {
                Some(memory) => memory.turns(),
                None => input.chat_history.as_deref().unwrap_or(&[]),
            };
            self.standalone_question(&input.question, history)?
        };

        let docs = self.retriever.relevant_documents(&standalone)?;
        let messages = self.qa_prompt.messages(&standalone, &docs);
        let answer = self.llm.complete(&messages)?;

        if let Some(memory) = self.memory.as_mut() {
            memory.save(Turn::new(input.question, answer.clone()));
        }

        Ok(ChainOutput {
            answer,
            source_documents: if self.return_source_documents { docs } else { Vec::new() },
        })
    }

    fn memory(&self) -> Option<&ConversationMemory> {
        self.memory.as_ref()
    }
}
