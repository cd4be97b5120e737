//! Anthropic Messages API adapter.
//!
//! System instructions go in the top-level `system` field; history turns
//! map one-to-one onto `messages`. Only the first `text` content block of a
//! reply is used.

use serde_json::Value;
use tg_domain::config::ProviderConfig;
use tg_domain::conversation::{ConversationTurn, Role};
use tg_domain::error::{Error, Result};

use crate::traits::{ChatRequest, ChatResponse, LlmProvider, Usage};
use crate::util::{from_reqwest, resolve_api_key};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Transport backstop; the gateway applies its own, shorter bound.
const CLIENT_TIMEOUT_SECS: u64 = 120;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct AnthropicProvider {
    id: String,
    base_url: String,
    api_key: String,
    default_model: String,
    max_tokens: u32,
    temperature: Option<f32>,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Resolve the credential and build the client. Called once at startup.
    pub fn from_config(cfg: &ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(&cfg.auth)?;
        Self::with_api_key(cfg, api_key)
    }

    /// Build with an already-resolved key.
    pub fn with_api_key(cfg: &ProviderConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            id: cfg.id.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            default_model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            client,
        })
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn authed_post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
    }

    fn build_messages_body(&self, req: &ChatRequest) -> Value {
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());

        let api_messages: Vec<Value> = req.messages.iter().map(turn_to_anthropic).collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": api_messages,
            "max_tokens": req.max_tokens.unwrap_or(self.max_tokens),
        });

        if !req.system.is_empty() {
            body["system"] = Value::String(req.system.clone());
        }
        if let Some(temp) = req.temperature.or(self.temperature) {
            body["temperature"] = serde_json::json!(temp);
        }

        body
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire mapping
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn turn_to_anthropic(turn: &ConversationTurn) -> Value {
    let role = match turn.role() {
        Role::User => "user",
        Role::Assistant => "assistant",
    };
    serde_json::json!({
        "role": role,
        "content": turn.content(),
    })
}

fn parse_anthropic_response(body: &Value) -> Result<ChatResponse> {
    let blocks = body
        .get("content")
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    // First text block only; tool_use, thinking, etc. are ignored.
    let content = blocks
        .iter()
        .find(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        .and_then(|b| b.get("text"))
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string();

    let model = body
        .get("model")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    let finish_reason = body
        .get("stop_reason")
        .and_then(|v| v.as_str())
        .map(|s| match s {
            "end_turn" => "stop".to_string(),
            other => other.to_string(),
        });

    let usage = body.get("usage").and_then(parse_anthropic_usage);

    Ok(ChatResponse {
        content,
        usage,
        model,
        finish_reason,
    })
}

fn parse_anthropic_usage(v: &Value) -> Option<Usage> {
    let input = v.get("input_tokens")?.as_u64()? as u32;
    let output = v.get("output_tokens")?.as_u64()? as u32;
    Some(Usage {
        prompt_tokens: input,
        completion_tokens: output,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trait implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_messages_body(&req);

        tracing::debug!(
            provider = %self.id,
            url = %url,
            turns = req.messages.len(),
            "anthropic chat request"
        );

        let resp = self
            .authed_post(&url)
            .json(&body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::Provider {
                provider: self.id.clone(),
                message: format!("HTTP {} - {}", status.as_u16(), resp_text),
            });
        }

        let resp_json: Value = serde_json::from_str(&resp_text)?;
        parse_anthropic_response(&resp_json)
    }

    fn provider_id(&self) -> &str {
        &self.id
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::with_api_key(&ProviderConfig::default(), "sk-test".into()).unwrap()
    }

    #[test]
    fn body_puts_instructions_in_system_field() {
        let req = ChatRequest {
            system: "You are a tutor.".into(),
            messages: vec![
                ConversationTurn::assistant("What did you notice?", 100),
                ConversationTurn::user("The ice melted faster in the sun.", 100),
            ],
            ..Default::default()
        };
        let body = provider().build_messages_body(&req);
        assert_eq!(body["system"], "You are a tutor.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "assistant");
        assert_eq!(body["messages"][1]["content"], "The ice melted faster in the sun.");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn request_overrides_model_and_max_tokens() {
        let req = ChatRequest {
            model: Some("claude-3-5-haiku-latest".into()),
            max_tokens: Some(64),
            temperature: Some(0.2),
            ..Default::default()
        };
        let body = provider().build_messages_body(&req);
        assert_eq!(body["model"], "claude-3-5-haiku-latest");
        assert_eq!(body["max_tokens"], 64);
        assert!(body.get("system").is_none());
        assert!(body.get("temperature").is_some());
    }

    #[test]
    fn response_uses_first_text_block_only() {
        let body = serde_json::json!({
            "model": "claude-sonnet-4-20250514",
            "stop_reason": "end_turn",
            "content": [
                {"type": "thinking", "thinking": "hidden"},
                {"type": "text", "text": "Why do you think that happened?"},
                {"type": "text", "text": "second block"}
            ],
            "usage": {"input_tokens": 120, "output_tokens": 9}
        });
        let resp = parse_anthropic_response(&body).unwrap();
        assert_eq!(resp.content, "Why do you think that happened?");
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
        assert_eq!(
            resp.usage,
            Some(Usage {
                prompt_tokens: 120,
                completion_tokens: 9
            })
        );
    }

    #[test]
    fn response_without_text_is_empty() {
        let body = serde_json::json!({"content": [{"type": "tool_use", "id": "x"}]});
        let resp = parse_anthropic_response(&body).unwrap();
        assert!(resp.content.is_empty());
        assert_eq!(resp.model, "unknown");
        assert!(resp.usage.is_none());
    }
}
