mod build_chain;
mod build_prompt;
mod chain;
mod chat_loop;
mod chunk_text;
mod config;
mod context;
mod document;
mod embed_chunks;
mod error;
mod generate;
mod http;
mod load_documents;
mod memory;
mod retrieve_chunks;
mod store_index;

pub use build_chain::{ChainBuilder, ChainKind, QaSession};
pub use build_prompt::{
    format_chat_history, format_context, Message, PromptTemplate, QaPrompt,
    DEFAULT_CONDENSE_TEMPLATE, DEFAULT_CUSTOM_QA_TEMPLATE,
};
pub use chain::{Chain, ChainInput, ChainOutput, ConversationalRetrievalChain};
pub use chat_loop::{is_exit_token, ChatLoop, DEFAULT_CHAIN, DEFAULT_QUESTION, EXIT_TOKENS};
pub use chunk_text::chunk_text;
pub use config::Config;
pub use context::AppContext;
pub use document::Document;
pub use embed_chunks::{Embedder, OpenAiEmbeddings};
pub use error::{RagError, Result};
pub use generate::{ChatModel, OpenAiChat};
pub use load_documents::load_documents;
pub use memory::{ConversationMemory, Turn};
pub use retrieve_chunks::{IndexRetriever, Retriever};
pub use store_index::{load_or_build, IndexOrigin, VectorIndex, INDEX_FILE};
