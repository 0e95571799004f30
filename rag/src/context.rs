use std::sync::Arc;

use crate::build_chain::ChainBuilder;
use crate::config::Config;
use crate::embed_chunks::{Embedder, OpenAiEmbeddings};
use crate::error::Result;
use crate::generate::{ChatModel, OpenAiChat};
use crate::retrieve_chunks::IndexRetriever;
use crate::store_index::{load_or_build, IndexOrigin, VectorIndex};

/// Everything built once per process: settings, clients and the index.
pub struct AppContext {
    config: Config,
    index: Arc<VectorIndex>,
    origin: IndexOrigin,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn ChatModel>,
}

impl AppContext {
    /// Connect the OpenAI clients and load or build the index.
    pub fn bootstrap(config: Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbeddings::new(&config)?);
        let llm: Arc<dyn ChatModel> = Arc::new(OpenAiChat::new(&config)?);
        Self::with_clients(config, embedder, llm)
    }

    pub fn with_clients(
        config: Config,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let (index, origin) = load_or_build(&config, embedder.as_ref())?;
        Ok(Self {
            config,
            index: Arc::new(index),
            origin,
            embedder,
            llm,
        })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn index_origin(&self) -> IndexOrigin {
        self.origin
    }

    pub fn chain_builder(&self) -> ChainBuilder {
        let retriever = IndexRetriever::new(
            self.index.clone(),
            self.embedder.clone(),
            self.config.top_k,
        );
        ChainBuilder::new(Arc::new(retriever), self.llm.clone(), &self.config)
    }
}
