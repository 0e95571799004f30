use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::from_str;
use std::fmt;
use std::time::Duration;

use crate::error::{RagError, Result};

/// Blocking JSON client for an OpenAI-compatible API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RagError::Upstream(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!(%url, "POST");
        let resp = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .map_err(|e| RagError::Upstream(format!("POST {} failed: {}", url, e)))?;
        let status = resp.status();
        let text = resp.text().unwrap_or_default();
        if !status.is_success() {
            return Err(RagError::Upstream(format!(
                "POST {} failed: {} {}",
                url, status, text
            )));
        }
        from_str::<T>(&text).map_err(|e| {
            RagError::Upstream(format!("POST {} decode failed: {} | {}", url, e, text))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_api_key() {
        let api = ApiClient::new("http://localhost:8080/v1/", "sk-secret-123", 5).unwrap();
        let shown = format!("{:?}", api);
        assert!(!shown.contains("sk-secret-123"));
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains("http://localhost:8080/v1"));
    }
}
