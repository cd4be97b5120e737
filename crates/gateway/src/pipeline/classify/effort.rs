//! Low-effort answer detection.

use std::collections::HashSet;

use regex::Regex;
use tg_domain::config::QualityConfig;

use super::{Classification, TextClassifier};

/// Matched after lowercasing, trimming edge punctuation and collapsing
/// whitespace.
const THROWAWAY_PHRASES: &[&str] = &[
    "idk", "i don't know", "dunno", "sure", "whatever", "ok", "okay", "yes", "no", "maybe",
    "i guess", "idc", "nothing", "no idea", "fine", "k", "lol", "same", "good", "nope", "yeah",
    "yep", "i dunno", "not sure",
];

/// Hedged one-liners with at most two words after the stem.
const TEMPLATE_SHAPES: &str = r"^(?:i (?:think|guess|agree|disagree)(?: \S+){0,2}|because)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffortReason {
    Throwaway,
    Template,
    TooShort,
}

impl EffortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffortReason::Throwaway => "throwaway_phrase",
            EffortReason::Template => "template_shape",
            EffortReason::TooShort => "too_short",
        }
    }
}

pub struct EffortClassifier {
    min_words: usize,
    throwaway: HashSet<String>,
    templates: Regex,
}

impl EffortClassifier {
    pub fn new(cfg: &QualityConfig) -> Result<Self, regex::Error> {
        let throwaway = THROWAWAY_PHRASES
            .iter()
            .map(|p| (*p).to_owned())
            .chain(cfg.extra_throwaway_phrases.iter().map(|p| normalize(p)))
            .filter(|p| !p.is_empty())
            .collect();
        Ok(Self {
            min_words: cfg.min_words,
            throwaway,
            templates: Regex::new(TEMPLATE_SHAPES)?,
        })
    }
}

/// Lowercase, unify apostrophes, trim non-alphanumeric edges and collapse
/// runs of whitespace.
fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace('’', "'");
    lowered
        .trim_matches(|c: char| !c.is_alphanumeric())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl TextClassifier for EffortClassifier {
    type Category = EffortReason;

    fn classify(&self, text: &str) -> Option<Classification<EffortReason>> {
        let norm = normalize(text);
        let words = norm.split_whitespace().count();
        let hit = |category| {
            Some(Classification {
                category,
                matched: norm.clone(),
            })
        };

        if self.throwaway.contains(&norm) {
            return hit(EffortReason::Throwaway);
        }
        if words == 1 || self.templates.is_match(&norm) {
            return hit(EffortReason::Template);
        }
        if words == 0 || words < self.min_words {
            return hit(EffortReason::TooShort);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> EffortClassifier {
        EffortClassifier::new(&QualityConfig::default()).unwrap()
    }

    fn reason(text: &str) -> Option<EffortReason> {
        classifier().classify(text).map(|c| c.category)
    }

    #[test]
    fn throwaway_phrases_match_after_normalizing() {
        assert_eq!(reason("idk"), Some(EffortReason::Throwaway));
        assert_eq!(reason("  IDK!!! "), Some(EffortReason::Throwaway));
        assert_eq!(reason("I don’t know."), Some(EffortReason::Throwaway));
        assert_eq!(reason("not   sure"), Some(EffortReason::Throwaway));
    }

    #[test]
    fn templated_shapes() {
        assert_eq!(reason("I think so"), Some(EffortReason::Template));
        assert_eq!(reason("I agree with her"), Some(EffortReason::Template));
        assert_eq!(reason("because"), Some(EffortReason::Template));
        assert_eq!(reason("photosynthesis"), Some(EffortReason::Template));
    }

    #[test]
    fn short_answers_fall_under_word_floor() {
        assert_eq!(reason("it gets bigger"), Some(EffortReason::TooShort));
        assert_eq!(reason("?!"), Some(EffortReason::TooShort));
    }

    #[test]
    fn substantive_answers_pass() {
        assert_eq!(reason("I think the denominator stays the same because the parts are equal"), None);
        assert_eq!(reason("The plant bends toward the window light."), None);
    }

    #[test]
    fn extra_phrases_extend_the_list() {
        let cfg = QualityConfig {
            extra_throwaway_phrases: vec!["Pass.".into(), "no clue at all".into()],
            ..QualityConfig::default()
        };
        let c = EffortClassifier::new(&cfg).unwrap();
        assert_eq!(
            c.classify("no clue at all").map(|c| c.category),
            Some(EffortReason::Throwaway)
        );
        assert_eq!(c.classify("pass").map(|c| c.category), Some(EffortReason::Throwaway));
    }

    #[test]
    fn zero_min_words_still_catches_lone_words() {
        let cfg = QualityConfig {
            min_words: 0,
            ..QualityConfig::default()
        };
        let c = EffortClassifier::new(&cfg).unwrap();
        assert_eq!(c.classify("it gets bigger"), None);
        assert_eq!(c.classify("bigger").map(|c| c.category), Some(EffortReason::Template));
    }
}
