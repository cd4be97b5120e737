use serde::Serialize;

/// Structured trace events emitted across all tutorgate crates.
///
/// Student text is never included; only categories, sizes and timings.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    /// A pipeline gate answered without calling the generator.
    GateShortCircuit {
        gate: String,
        reason: String,
        exchange_count: u32,
    },
    RateLimited {
        route_class: String,
        retry_after_secs: u64,
    },
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    LlmTimeout {
        provider: String,
        timeout_ms: u64,
    },
    EpisodeCompleted {
        mode: String,
        exchange_count: u32,
    },
    RecordWrite {
        kind: String,
        backend: String,
        ok: bool,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "tg_event");
    }
}
