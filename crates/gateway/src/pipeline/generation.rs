//! Timeout-bounded call to the text-generation service.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tg_domain::trace::TraceEvent;
use tg_providers::{ChatRequest, LlmProvider};

/// Shown when the generator does not answer in time.
pub const STILL_THINKING_MESSAGE: &str =
    "I'm still thinking about that one. Could you send your answer again in a moment?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Reply(String),
    /// The call exceeded its bound. The episode stays open.
    StillThinking,
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] tg_domain::error::Error),
    #[error("generator returned an empty reply")]
    EmptyReply,
}

pub struct GenerationGateway {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl GenerationGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn provider_id(&self) -> &str {
        self.provider.provider_id()
    }

    /// Single attempt, no retry. On timeout the in-flight future is
    /// dropped, which aborts the underlying HTTP request.
    pub async fn generate(&self, req: ChatRequest) -> Result<GenerationOutcome, GenerationError> {
        let start = Instant::now();
        let model = req
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_owned());

        let resp = match tokio::time::timeout(self.timeout, self.provider.chat(req)).await {
            Ok(result) => result?,
            Err(_) => {
                TraceEvent::LlmTimeout {
                    provider: self.provider.provider_id().to_owned(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }
                .emit();
                return Ok(GenerationOutcome::StillThinking);
            }
        };

        TraceEvent::LlmRequest {
            provider: self.provider.provider_id().to_owned(),
            model: if resp.model.is_empty() { model } else { resp.model.clone() },
            duration_ms: start.elapsed().as_millis() as u64,
            prompt_tokens: resp.usage.map(|u| u.prompt_tokens),
            completion_tokens: resp.usage.map(|u| u.completion_tokens),
        }
        .emit();

        if resp.content.trim().is_empty() {
            return Err(GenerationError::EmptyReply);
        }
        Ok(GenerationOutcome::Reply(resp.content))
    }
}
