use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tutoring pipeline limits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Shape limits for inbound turns and the completion contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Character cap for the new message (rejected above) and for every
    /// history turn (truncated above).
    #[serde(default = "d_2000")]
    pub max_message_chars: usize,
    /// Hard cap on prior turns; more is a validation failure.
    #[serde(default = "d_50")]
    pub max_history_turns: usize,
    /// Character cap for `skill_name` and `compelling_question`.
    #[serde(default = "d_500")]
    pub max_context_chars: usize,
    /// Inclusive upper bound for `exchange_count`.
    #[serde(default = "d_100")]
    pub max_exchange_count: u32,
    /// Inclusive bounds for `min_exchanges`.
    #[serde(default = "d_1")]
    pub min_exchanges_floor: u32,
    #[serde(default = "d_20")]
    pub min_exchanges_ceiling: u32,
    /// Turns copied into a crisis alert (new user turn included).
    #[serde(default = "d_5")]
    pub crisis_context_turns: usize,
    /// Marker the model emits when it judges the episode finished.
    #[serde(default = "d_sentinel")]
    pub completion_sentinel: String,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 2000,
            max_history_turns: 50,
            max_context_chars: 500,
            max_exchange_count: 100,
            min_exchanges_floor: 1,
            min_exchanges_ceiling: 20,
            crisis_context_turns: 5,
            completion_sentinel: d_sentinel(),
        }
    }
}

/// Low-effort / generated-text gate tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Answers with fewer words than this are low effort.
    #[serde(default = "d_4")]
    pub min_words: usize,
    /// Added to the built-in throwaway phrase list (matched after
    /// lowercasing and trimming punctuation).
    #[serde(default)]
    pub extra_throwaway_phrases: Vec<String>,
    /// Distinct weak machine-prose markers needed before the
    /// generated-text gate fires.
    #[serde(default = "d_2")]
    pub generated_weak_marker_threshold: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_words: 4,
            extra_throwaway_phrases: Vec::new(),
            generated_weak_marker_threshold: 2,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_1() -> u32 {
    1
}
fn d_2() -> usize {
    2
}
fn d_4() -> usize {
    4
}
fn d_5() -> usize {
    5
}
fn d_20() -> u32 {
    20
}
fn d_50() -> usize {
    50
}
fn d_100() -> u32 {
    100
}
fn d_500() -> usize {
    500
}
fn d_2000() -> usize {
    2000
}
fn d_sentinel() -> String {
    "[SESSION_COMPLETE]".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tutor_defaults() {
        let cfg: TutorConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.max_message_chars, 2000);
        assert_eq!(cfg.max_history_turns, 50);
        assert_eq!(cfg.min_exchanges_floor, 1);
        assert_eq!(cfg.min_exchanges_ceiling, 20);
        assert_eq!(cfg.max_exchange_count, 100);
        assert_eq!(cfg.completion_sentinel, "[SESSION_COMPLETE]");
    }

    #[test]
    fn quality_extra_phrases_parse() {
        let cfg: QualityConfig = toml::from_str(
            r#"
            min_words = 6
            extra_throwaway_phrases = ["meh", "who cares"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.min_words, 6);
        assert_eq!(cfg.extra_throwaway_phrases.len(), 2);
        assert_eq!(cfg.generated_weak_marker_threshold, 2);
    }
}
