use tg_domain::conversation::ConversationTurn;
use tg_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic generation request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Composed tutoring instructions (sent as the system prompt).
    pub system: String,
    /// Sanitized history followed by the new user turn.
    pub messages: Vec<ConversationTurn>,
    /// Sampling temperature. `None` lets the provider choose.
    pub temperature: Option<f32>,
    /// Maximum tokens in the response. `None` uses the provider default.
    pub max_tokens: Option<u32>,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

/// A provider-agnostic generation response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Text of the first text-typed content block.
    pub content: String,
    /// Token usage information.
    pub usage: Option<Usage>,
    /// The model that actually produced the response.
    pub model: String,
    /// Why the model stopped (e.g. "stop", "max_tokens").
    pub finish_reason: Option<String>,
}

/// Token usage for a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The external text-generation service.
///
/// Implementations translate between our internal types and a vendor's
/// HTTP wire format. Dropping the returned future must abort the call.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request and wait for the full response.
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;

    /// Model used when the request does not name one.
    fn default_model(&self) -> &str;
}
