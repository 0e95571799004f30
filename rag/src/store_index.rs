use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chunk_text::chunk_text;
use crate::config::Config;
use crate::document::Document;
use crate::embed_chunks::Embedder;
use crate::error::{RagError, Result};
use crate::load_documents::load_documents;

pub const INDEX_FILE: &str = "index.json";
const INDEX_TMP_FILE: &str = "index.json.tmp";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Entry {
    document: Document,
    embedding: Vec<f32>,
}

/// In-memory vector store over embedded document chunks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorIndex {
    embed_model: String,
    entries: Vec<Entry>,
}

/// Whether `load_or_build` read a persisted index or embedded the corpus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexOrigin {
    Reused,
    Built,
}

impl VectorIndex {
    pub fn new(embed_model: impl Into<String>) -> Self {
        Self {
            embed_model: embed_model.into(),
            entries: Vec::new(),
        }
    }

    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, document: Document, embedding: Vec<f32>) {
        self.entries.push(Entry { document, embedding });
    }

    /// Top `k` documents by cosine similarity, best first. Equal scores keep
    /// insertion order.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Vec<Document> {
        let mut scored: Vec<(f32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (cosine_similarity(query, &e.embedding), i))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(k)
            .map(|(_, i)| self.entries[i].document.clone())
            .collect()
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let data = serde_json::to_vec(self)?;
        // Readers only ever see a complete index.json.
        let tmp = dir.join(INDEX_TMP_FILE);
        fs::write(&tmp, data)?;
        fs::rename(&tmp, dir.join(INDEX_FILE))?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let data = fs::read(dir.join(INDEX_FILE))?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Embed every chunk of every document under the data directory.
    pub fn build(cfg: &Config, embedder: &dyn Embedder) -> Result<Self> {
        let mut index = Self::new(embedder.model_name());
        for doc in load_documents(cfg)? {
            let chunks = chunk_text(&doc.content, cfg);
            if chunks.is_empty() {
                continue;
            }
            let vectors = embedder.embed_texts(&chunks)?;
            for (chunk, vector) in chunks.into_iter().zip(vectors) {
                index.add(Document::new(chunk, doc.source.clone()), vector);
            }
        }
        if index.is_empty() {
            tracing::warn!(dir = %cfg.data_dir.display(), "no documents to index");
        }
        tracing::info!(chunks = index.len(), "built index");
        Ok(index)
    }
}

/// Reuse the persisted index when persistence is on and one exists,
/// otherwise build a fresh one (saving it when persistence is on).
pub fn load_or_build(cfg: &Config, embedder: &dyn Embedder) -> Result<(VectorIndex, IndexOrigin)> {
    if cfg.persist && cfg.index_file().is_file() {
        let index = VectorIndex::load(&cfg.persist_dir)?;
        if index.embed_model() != embedder.model_name() {
            return Err(RagError::Configuration(format!(
                "index in {} was built with {}, but {} is configured",
                cfg.persist_dir.display(),
                index.embed_model(),
                embedder.model_name()
            )));
        }
        tracing::info!(chunks = index.len(), dir = %cfg.persist_dir.display(), "reusing index");
        return Ok((index, IndexOrigin::Reused));
    }

    let index = VectorIndex::build(cfg, embedder)?;
    if cfg.persist {
        index.save(&cfg.persist_dir)?;
    }
    Ok((index, IndexOrigin::Built))
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_ranks_by_cosine() {
        let mut index = VectorIndex::new("m");
        index.add(Document::new("x axis", "x.txt"), vec![1.0, 0.0]);
        index.add(Document::new("y axis", "y.txt"), vec![0.0, 1.0]);
        index.add(Document::new("diagonal", "d.txt"), vec![1.0, 1.0]);

        let top = index.similarity_search(&[0.1, 1.0], 2);
        assert_eq!(top[0].source, "y.txt");
        assert_eq!(top[1].source, "d.txt");
        assert_eq!(index.similarity_search(&[1.0, 0.0], 10).len(), 3);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut index = VectorIndex::new("m");
        index.add(Document::new("first", "a"), vec![1.0, 0.0]);
        index.add(Document::new("second", "b"), vec![2.0, 0.0]);
        let top = index.similarity_search(&[1.0, 0.0], 1);
        assert_eq!(top[0].content, "first");
    }

    #[test]
    fn mismatched_or_zero_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
