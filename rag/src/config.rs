use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{RagError, Result};

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub temperature: f32,
    pub embed_model: String,
    pub embed_batch: usize,
    pub data_dir: PathBuf,
    pub persist_dir: PathBuf,
    pub persist: bool,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub http_timeout_secs: u64,
    pub qa_template: Option<String>,
    pub condense_template: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("embed_model", &self.embed_model)
            .field("embed_batch", &self.embed_batch)
            .field("data_dir", &self.data_dir)
            .field("persist_dir", &self.persist_dir)
            .field("persist", &self.persist)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("top_k", &self.top_k)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("qa_template", &self.qa_template)
            .field("condense_template", &self.condense_template)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env if present so the API key works without manual `export`.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            RagError::Configuration("OPENAI_API_KEY is not set".to_string())
        })?;

        Ok(Self {
            api_key: api_key.trim().to_string(),
            base_url: get("OPENAI_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            chat_model: get("DOCCHAT_CHAT_MODEL").unwrap_or_else(|| "gpt-4".to_string()),
            temperature: parse_or("DOCCHAT_TEMPERATURE", get("DOCCHAT_TEMPERATURE"), 0.7)?,
            embed_model: get("DOCCHAT_EMBED_MODEL")
                .unwrap_or_else(|| "text-embedding-ada-002".to_string()),
            embed_batch: parse_or::<usize>(
                "DOCCHAT_EMBED_BATCH",
                get("DOCCHAT_EMBED_BATCH"),
                1000,
            )?
            .max(1),
            data_dir: get("DOCCHAT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/")),
            persist_dir: get("DOCCHAT_PERSIST_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("persist")),
            persist: match get("DOCCHAT_PERSIST") {
                Some(v) => parse_flag("DOCCHAT_PERSIST", &v)?,
                None => false,
            },
            chunk_size: parse_or("DOCCHAT_CHUNK_SIZE", get("DOCCHAT_CHUNK_SIZE"), 1000)?,
            chunk_overlap: parse_or("DOCCHAT_CHUNK_OVERLAP", get("DOCCHAT_CHUNK_OVERLAP"), 0)?,
            top_k: parse_or("DOCCHAT_TOP_K", get("DOCCHAT_TOP_K"), 1)?,
            http_timeout_secs: parse_or(
                "DOCCHAT_HTTP_TIMEOUT_SECS",
                get("DOCCHAT_HTTP_TIMEOUT_SECS"),
                120,
            )?,
            qa_template: get("DOCCHAT_QA_TEMPLATE"),
            condense_template: get("DOCCHAT_CONDENSE_TEMPLATE"),
        })
    }

    pub fn index_file(&self) -> PathBuf {
        self.persist_dir.join(crate::store_index::INDEX_FILE)
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| {
            RagError::Configuration(format!("{} has an invalid value: {:?}", key, v))
        }),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RagError::Configuration(format!(
            "{} must be a boolean, got {:?}",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let err = Config::from_lookup(lookup(&[])).expect_err("key is required");
        assert!(matches!(err, RagError::Configuration(_)));

        let err = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")]))
            .expect_err("blank key is rejected");
        assert!(matches!(err, RagError::Configuration(_)));
    }

    #[test]
    fn defaults_match_the_stock_setup() {
        let cfg = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(cfg.api_key, "sk-test");
        assert_eq!(cfg.chat_model, "gpt-4");
        assert_eq!(cfg.data_dir, PathBuf::from("data/"));
        assert_eq!(cfg.persist_dir, PathBuf::from("persist"));
        assert!(!cfg.persist);
        assert_eq!(cfg.chunk_size, 1000);
        assert_eq!(cfg.chunk_overlap, 0);
        assert_eq!(cfg.top_k, 1);
        assert!(cfg.qa_template.is_none());
    }

    #[test]
    fn overrides_and_flag_spellings() {
        let cfg = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("DOCCHAT_PERSIST", "Yes"),
            ("DOCCHAT_TOP_K", "4"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url, "http://localhost:8080/v1");
        assert!(cfg.persist);
        assert_eq!(cfg.top_k, 4);
        assert_eq!(cfg.index_file(), PathBuf::from("persist").join("index.json"));
    }

    #[test]
    fn rejects_unparseable_values() {
        let err = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("DOCCHAT_CHUNK_SIZE", "large"),
        ]))
        .expect_err("chunk size must be numeric");
        assert!(err.to_string().contains("DOCCHAT_CHUNK_SIZE"));

        let err = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("DOCCHAT_PERSIST", "maybe"),
        ]))
        .expect_err("persist must be boolean");
        assert!(err.to_string().contains("DOCCHAT_PERSIST"));
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let cfg = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret-123")])).unwrap();
        let shown = format!("{:?}", cfg);
        assert!(!shown.contains("sk-secret-123"));
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("text-embedding-ada-002"));
    }
}
