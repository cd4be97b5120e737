//! Episode completion decision and sentinel stripping.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionVerdict {
    /// Reply text with every sentinel removed.
    pub message: String,
    pub should_complete: bool,
    pub response_count: u32,
}

const CLOSING_MESSAGE: &str = "Great work today! You've finished this conversation.";
const CONTINUE_MESSAGE: &str = "Keep going. Tell me more about your thinking.";

pub struct CompletionEvaluator {
    sentinel: String,
}

impl CompletionEvaluator {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
        }
    }

    /// Completion needs the sentinel *and* `exchange_count >= min_exchanges - 1`.
    pub fn evaluate(&self, reply: &str, exchange_count: u32, min_exchanges: u32) -> CompletionVerdict {
        let has_sentinel = reply.contains(&self.sentinel);
        let should_complete = has_sentinel && exchange_count + 1 >= min_exchanges;

        let mut message = self.strip(reply);
        if message.is_empty() {
            message = if should_complete { CLOSING_MESSAGE } else { CONTINUE_MESSAGE }.to_owned();
        }

        CompletionVerdict {
            message,
            should_complete,
            response_count: exchange_count + 1,
        }
    }

    fn strip(&self, reply: &str) -> String {
        reply
            .replace(&self.sentinel, "")
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_owned()
    }
}
