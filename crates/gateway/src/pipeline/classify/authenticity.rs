//! Machine-written prose detection.
//!
//! Strong fingerprints are canned assistant phrasing and fire on their own.
//! Weak markers are stock transitions and hedges that students do use, so
//! several distinct ones must co-occur before the gate fires.

use regex::Regex;

use super::{Classification, TextClassifier};

const STRONG: &[&str] = &[
    r"\bas an ai\b",
    r"\bas a (?:large )?language model\b",
    r"\bi hope this helps\b",
    r"\bcertainly!\s*here\b",
    r"\bhere(?:'s| is) a (?:concise|brief|detailed) (?:summary|explanation|overview)\b",
    r"\bregenerate response\b",
    r"\bi (?:cannot|can't) provide personal (?:opinions|experiences)\b",
];

const WEAK: &[&str] = &[
    r"\bfurthermore\b",
    r"\bmoreover\b",
    r"\bin conclusion\b",
    r"\bit is important to note\b",
    r"\bit(?:'s| is) worth noting\b",
    r"\bdelv(?:e|es|ing)\b",
    r"\badditionally\b",
    r"\bin summary\b",
    r"\bplays? a (?:crucial|pivotal|vital) role\b",
    r"\ba testament to\b",
    r"\bmultifaceted\b",
    r"\bnavigat(?:e|ing) the complexities\b",
    r"\btapestry\b",
    r"\bin today's (?:world|society)\b",
    r"\bfirstly\b.*\bsecondly\b",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedSignal {
    /// A single unmistakable assistant phrase.
    Fingerprint,
    /// This many distinct weak markers.
    WeakMarkers(usize),
}

pub struct AuthenticityClassifier {
    strong: Vec<Regex>,
    weak: Vec<Regex>,
    weak_threshold: usize,
}

impl AuthenticityClassifier {
    pub fn new(weak_threshold: usize) -> Result<Self, regex::Error> {
        let compile = |patterns: &[&str]| {
            patterns
                .iter()
                .map(|p| Regex::new(&format!("(?is){p}")))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            strong: compile(STRONG)?,
            weak: compile(WEAK)?,
            weak_threshold: weak_threshold.max(1),
        })
    }
}

impl TextClassifier for AuthenticityClassifier {
    type Category = GeneratedSignal;

    fn classify(&self, text: &str) -> Option<Classification<GeneratedSignal>> {
        let text = text.replace('’', "'");

        if let Some(m) = self.strong.iter().find_map(|re| re.find(&text)) {
            return Some(Classification {
                category: GeneratedSignal::Fingerprint,
                matched: m.as_str().to_owned(),
            });
        }

        let hits: Vec<&str> = self
            .weak
            .iter()
            .filter_map(|re| re.find(&text).map(|m| m.as_str()))
            .collect();
        if hits.len() >= self.weak_threshold {
            return Some(Classification {
                category: GeneratedSignal::WeakMarkers(hits.len()),
                matched: hits.join(", "),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> Option<GeneratedSignal> {
        AuthenticityClassifier::new(2)
            .unwrap()
            .classify(text)
            .map(|c| c.category)
    }

    #[test]
    fn strong_fingerprint_fires_alone() {
        assert_eq!(
            classify("As an AI, I think the answer is 42."),
            Some(GeneratedSignal::Fingerprint)
        );
        assert_eq!(
            classify("Certainly! Here is my answer about the water cycle."),
            Some(GeneratedSignal::Fingerprint)
        );
        assert_eq!(
            classify("Evaporation moves water up. I hope this helps!"),
            Some(GeneratedSignal::Fingerprint)
        );
    }

    #[test]
    fn one_weak_marker_is_not_enough() {
        assert_eq!(classify("Moreover the rain falls back into the lake."), None);
    }

    #[test]
    fn two_distinct_weak_markers_fire() {
        let text = "Furthermore, the water cycle plays a crucial role in weather. \
                    Moreover, evaporation matters.";
        assert_eq!(classify(text), Some(GeneratedSignal::WeakMarkers(3)));
    }

    #[test]
    fn repeated_single_marker_counts_once() {
        assert_eq!(classify("Moreover it rains. Moreover it snows."), None);
    }

    #[test]
    fn plain_student_prose_is_clean() {
        assert_eq!(
            classify("i think it rains because the clouds get too heavy with water"),
            None
        );
    }
}
