use serde::{Deserialize, Serialize};

use crate::build_prompt::Message;
use crate::config::Config;
use crate::error::{RagError, Result};
use crate::http::ApiClient;

/// A hosted chat-completion model.
pub trait ChatModel {
    fn complete(&self, messages: &[Message]) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OpenAiChat {
    api: ApiClient,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(cfg: &Config) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(&cfg.base_url, &cfg.api_key, cfg.http_timeout_secs)?,
            model: cfg.chat_model.clone(),
            temperature: cfg.temperature,
        })
    }
}

impl ChatModel for OpenAiChat {
    fn complete(&self, messages: &[Message]) -> Result<String> {
        let req = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };
        let res: ChatResponse = self.api.post_json("chat/completions", &req)?;
        first_content(res)
    }
}

fn first_content(res: ChatResponse) -> Result<String> {
    res.choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or_else(|| RagError::Upstream("completion returned no choices".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_first_choice() {
        let res: ChatResponse = serde_json::from_str(
            r#"{"choices":[
                {"message":{"role":"assistant","content":"hi"}},
                {"message":{"content":"no"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(first_content(res).unwrap(), "hi");
    }

    #[test]
    fn empty_choices_is_an_upstream_error() {
        let res: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_content(res), Err(RagError::Upstream(_))));
    }
}
