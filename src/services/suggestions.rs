use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::OpenRouterConfig;

pub const SUGGESTIONS_UNAVAILABLE: &str = "Apologies, the AI suggestion service is unavailable right now. \
Please make sure the API key is configured correctly.";
pub const NO_SUGGESTIONS: &str = "AI did not return any suggestions.";

/// Proxy to an OpenAI-compatible chat completion endpoint. Never fails: problems
/// become a human-readable fallback text.
pub struct SuggestionClient {
    http: reqwest::Client,
    config: OpenRouterConfig,
    referer: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    content: String,
}

impl SuggestionClient {
    pub fn new(config: OpenRouterConfig, referer: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            referer: referer.into(),
        }
    }

    pub async fn suggest(&self, title: &str, content: &str) -> String {
        match self.request(title, content).await {
            Ok(Some(text)) => text,
            Ok(None) => NO_SUGGESTIONS.to_string(),
            Err(e) => {
                tracing::warn!("AI suggestion request failed: {:#}", e);
                SUGGESTIONS_UNAVAILABLE.to_string()
            }
        }
    }

    async fn request(&self, title: &str, content: &str) -> Result<Option<String>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY is not set"))?;
        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt(title, content) }],
        });
        let response: ChatResponse = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", "SmartBlog")
            .json(&body)
            .send()
            .await
            .context("Failed to reach AI provider")?
            .error_for_status()
            .context("AI provider returned an error")?
            .json()
            .await
            .context("Unexpected AI provider response")?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty()))
    }
}

fn prompt(title: &str, content: &str) -> String {
    format!(
        "You are an experienced blog editor. Review the post below and suggest improvements.\n\n\
Title: {title}\n\nContent:\n{content}\n\n\
Point out grammar or spelling mistakes, places where the flow could be smoother and phrasing \
that could be more engaging. Reply with a numbered list of 3 to 5 concrete suggestions only; \
do not rewrite the post."
    )
}
