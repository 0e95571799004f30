use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::build_prompt::{
    condense_prompt, PromptTemplate, QaPrompt, DEFAULT_CONDENSE_TEMPLATE,
    DEFAULT_CUSTOM_QA_TEMPLATE,
};
use crate::chain::{Chain, ChainInput, ChainOutput, ConversationalRetrievalChain};
use crate::config::Config;
use crate::error::{RagError, Result};
use crate::generate::ChatModel;
use crate::memory::{ConversationMemory, Turn};
use crate::retrieve_chunks::Retriever;

/// The four ways a session can be wired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainKind {
    Basic,
    WithSources,
    CustomPrompt,
    CondensePrompt,
}

impl ChainKind {
    pub const ALL: [ChainKind; 4] = [
        ChainKind::Basic,
        ChainKind::WithSources,
        ChainKind::CustomPrompt,
        ChainKind::CondensePrompt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ChainKind::Basic => "basic",
            ChainKind::WithSources => "with_sources",
            ChainKind::CustomPrompt => "custom_prompt",
            ChainKind::CondensePrompt => "condense_prompt",
        }
    }

    /// History is passed in by the caller instead of kept by the chain.
    pub fn caller_managed_history(self) -> bool {
        matches!(self, ChainKind::WithSources)
    }
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChainKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        ChainKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| {
                RagError::Configuration(format!(
                    "unknown chain {:?}, expected one of: {}",
                    s,
                    ChainKind::ALL.map(ChainKind::name).join(", ")
                ))
            })
    }
}

/// Assembles a `QaSession` for a chosen `ChainKind`.
pub struct ChainBuilder {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn ChatModel>,
    qa_template: String,
    condense_template: String,
}

impl ChainBuilder {
    pub fn new(retriever: Arc<dyn Retriever>, llm: Arc<dyn ChatModel>, cfg: &Config) -> Self {
        Self {
            retriever,
            llm,
            qa_template: cfg
                .qa_template
                .clone()
                .unwrap_or_else(|| DEFAULT_CUSTOM_QA_TEMPLATE.to_string()),
            condense_template: cfg
                .condense_template
                .clone()
                .unwrap_or_else(|| DEFAULT_CONDENSE_TEMPLATE.to_string()),
        }
    }

    pub fn build(&self, name: &str) -> Result<QaSession> {
        self.build_kind(name.parse()?)
    }

    pub fn build_kind(&self, kind: ChainKind) -> Result<QaSession> {
        let default_condense = condense_prompt(DEFAULT_CONDENSE_TEMPLATE)?;
        let chain = match kind {
            ChainKind::Basic => self
                .chain(QaPrompt::Default, default_condense)
                .with_memory(ConversationMemory::new()),
            ChainKind::CustomPrompt => self
                .chain(QaPrompt::custom(self.qa_template.as_str())?, default_condense)
                .with_memory(ConversationMemory::new()),
            ChainKind::CondensePrompt => self
                .chain(
                    QaPrompt::custom(self.qa_template.as_str())?,
                    condense_prompt(self.condense_template.as_str())?,
                )
                .with_memory(ConversationMemory::new()),
            // Returning sources breaks the chain's own memory bookkeeping, so
            // the session threads history through every call instead.
            ChainKind::WithSources => self
                .chain(QaPrompt::Default, default_condense)
                .return_source_documents(true),
        };
        tracing::debug!(chain = %kind, "built chain");
        Ok(QaSession::new(kind, Box::new(chain)))
    }

    fn chain(&self, qa_prompt: QaPrompt, condense: PromptTemplate) -> ConversationalRetrievalChain {
        ConversationalRetrievalChain::new(
            self.retriever.clone(),
            self.llm.clone(),
            qa_prompt,
            condense,
        )
    }
}

/// The active chain plus any history the caller has to carry for it.
pub struct QaSession {
    kind: ChainKind,
    chain: Box<dyn Chain>,
    history: Vec<Turn>,
}

impl QaSession {
    pub fn new(kind: ChainKind, chain: Box<dyn Chain>) -> Self {
        Self {
            kind,
            chain,
            history: Vec::new(),
        }
    }

    pub fn kind(&self) -> ChainKind {
        self.kind
    }

    /// Turns threaded through the chain by the session (`with_sources` only).
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn chain_memory(&self) -> Option<&ConversationMemory> {
        self.chain.memory()
    }

    pub fn ask(&mut self, question: &str) -> Result<ChainOutput> {
        if !self.kind.caller_managed_history() {
            return self.chain.call(ChainInput::question(question));
        }
        let output = self.chain.call(ChainInput {
            question: question.to_string(),
            chat_history: Some(self.history.clone()),
        })?;
        self.history.push(Turn::new(question, output.answer.clone()));
        Ok(output)
    }
}
