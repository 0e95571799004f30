use std::sync::Arc;

use crate::document::Document;
use crate::embed_chunks::Embedder;
use crate::error::Result;
use crate::store_index::VectorIndex;

/// Finds the documents most relevant to a query.
pub trait Retriever {
    fn relevant_documents(&self, query: &str) -> Result<Vec<Document>>;
}

pub struct IndexRetriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl IndexRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }
}

impl Retriever for IndexRetriever {
    fn relevant_documents(&self, query: &str) -> Result<Vec<Document>> {
        if self.index.is_empty() {
            return Ok(vec![]);
        }
        let vector = self.embedder.embed_query(query)?;
        let docs = self.index.similarity_search(&vector, self.top_k);
        tracing::debug!(query, hits = docs.len(), "retrieved documents");
        Ok(docs)
    }
}
