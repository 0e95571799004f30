use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::http::ApiClient;

/// Turns text into embedding vectors.
pub trait Embedder {
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let vecs = self.embed_texts(&[text.to_string()])?;
        vecs.into_iter()
            .next()
            .ok_or_else(|| RagError::Upstream("no embedding returned for query".to_string()))
    }

    fn model_name(&self) -> &str;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedRow>,
}

#[derive(Deserialize)]
struct EmbedRow {
    index: usize,
    embedding: Vec<f32>,
}

pub struct OpenAiEmbeddings {
    api: ApiClient,
    model: String,
    batch: usize,
}

impl OpenAiEmbeddings {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(&cfg.base_url, &cfg.api_key, cfg.http_timeout_secs)?,
            model: cfg.embed_model.clone(),
            batch: cfg.embed_batch.max(1),
        })
    }
}

impl Embedder for OpenAiEmbeddings {
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch) {
            let req = EmbedRequest {
                model: &self.model,
                input: batch,
            };
            let res: EmbedResponse = self.api.post_json("embeddings", &req)?;
            out.extend(order_rows(res.data, batch.len())?);
        }
        Ok(out)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn order_rows(mut rows: Vec<EmbedRow>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if rows.len() != expected {
        return Err(RagError::Upstream(format!(
            "expected {} embeddings, got {}",
            expected,
            rows.len()
        )));
    }
    rows.sort_by_key(|r| r.index);
    Ok(rows.into_iter().map(|r| r.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_reordered_by_index() {
        let rows: EmbedResponse = serde_json::from_str(
            r#"{"data":[{"index":1,"embedding":[2.0]},{"index":0,"embedding":[1.0]}]}"#,
        )
        .unwrap();
        assert_eq!(order_rows(rows.data, 2).unwrap(), vec![vec![1.0], vec![2.0]]);
    }

    #[test]
    fn short_response_is_an_upstream_error() {
        let rows: EmbedResponse =
            serde_json::from_str(r#"{"data":[{"index":0,"embedding":[1.0]}]}"#).unwrap();
        assert!(matches!(order_rows(rows.data, 2), Err(RagError::Upstream(_))));
    }
}
