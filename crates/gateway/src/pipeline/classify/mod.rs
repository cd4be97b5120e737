//! Pattern classifiers that gate student text before generation.
//!
//! Every classifier is a pure, memoryless function of the text, compiled
//! once at startup and shared across requests.

pub mod authenticity;
pub mod crisis;
pub mod effort;

pub use authenticity::{AuthenticityClassifier, GeneratedSignal};
pub use crisis::CrisisDetector;
pub use effort::{EffortClassifier, EffortReason};

use tg_domain::config::QualityConfig;

/// A positive classification: which category fired and on what text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<C> {
    pub category: C,
    /// The substring (or phrase) that triggered the match.
    pub matched: String,
}

/// Uniform interface over the regex-table classifiers.
pub trait TextClassifier: Send + Sync {
    type Category;

    /// `None` when the text is clean.
    fn classify(&self, text: &str) -> Option<Classification<Self::Category>>;
}

/// Outcome of the low-effort and generated-text checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityVerdict {
    Pass,
    LowEffort(Classification<EffortReason>),
    Generated(Classification<GeneratedSignal>),
}

/// Low-effort and generated-text checks, applied in that order.
pub struct QualityGate {
    effort: EffortClassifier,
    authenticity: AuthenticityClassifier,
}

impl QualityGate {
    pub fn new(cfg: &QualityConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            effort: EffortClassifier::new(cfg)?,
            authenticity: AuthenticityClassifier::new(cfg.generated_weak_marker_threshold)?,
        })
    }

    /// Low effort only blocks while `exchange_count < min_exchanges`;
    /// generated text is blocked at any point in the episode.
    pub fn evaluate(&self, text: &str, exchange_count: u32, min_exchanges: u32) -> QualityVerdict {
        if exchange_count < min_exchanges {
            if let Some(hit) = self.effort.classify(text) {
                return QualityVerdict::LowEffort(hit);
            }
        }
        match self.authenticity.classify(text) {
            Some(hit) => QualityVerdict::Generated(hit),
            None => QualityVerdict::Pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> QualityGate {
        QualityGate::new(&QualityConfig::default()).unwrap()
    }

    #[test]
    fn low_effort_blocks_only_before_threshold() {
        let gate = gate();
        assert!(matches!(gate.evaluate("idk", 0, 5), QualityVerdict::LowEffort(_)));
        assert!(matches!(gate.evaluate("idk", 4, 5), QualityVerdict::LowEffort(_)));
        assert_eq!(gate.evaluate("idk", 5, 5), QualityVerdict::Pass);
        assert_eq!(gate.evaluate("idk", 9, 5), QualityVerdict::Pass);
    }

    #[test]
    fn generated_text_blocks_regardless_of_count() {
        let gate = gate();
        let text = "As an AI language model, I would say photosynthesis converts light.";
        assert!(matches!(gate.evaluate(text, 0, 5), QualityVerdict::Generated(_)));
        assert!(matches!(gate.evaluate(text, 12, 5), QualityVerdict::Generated(_)));
    }

    #[test]
    fn genuine_answer_passes() {
        let gate = gate();
        let text = "I think the plant gets bigger because it uses sunlight to make sugar.";
        assert_eq!(gate.evaluate(text, 1, 5), QualityVerdict::Pass);
    }
}
