//! Crisis-language detection.
//!
//! Categories are checked in a fixed priority order and the first hit
//! wins. Apostrophes may be straight or curly.

use regex::Regex;
use tg_domain::records::CrisisCategory;

use super::{Classification, TextClassifier};

const SELF_HARM: &[&str] = &[
    r"\bkill(?:ing)?\s+my\s*self\b",
    r"\bsuicid(?:e|al)\b",
    r"\bend\s+(?:my\s+life|it\s+all)\b",
    r"\b(?:want|wanna|going)\s+(?:to\s+)?die\b",
    r"\b(?:hurt|hurting|cut|cutting)\s+my\s*self\b",
    r"\bself[-\s]?harm",
    r"\bdon['’]?t\s+want\s+to\s+(?:be\s+alive|live|exist)\b",
    r"\bbetter\s+off\s+dead\b",
];

const HELPLESSNESS: &[&str] = &[
    r"\bno\s+(?:reason|point)\s+(?:to|in)\s+(?:live|living|going\s+on)\b",
    r"\bnobody\s+(?:cares|would\s+(?:care|miss\s+me))\b",
    r"\b(?:i['’]?m|i\s+am|i\s+feel)\s+(?:so\s+)?(?:hopeless|worthless)\b",
    r"\bcan['’]?t\s+(?:go\s+on|take\s+(?:it|this)\s+anymore)\b",
    r"\bbetter\s+off\s+without\s+me\b",
    r"\bnothing\s+matters\s+anymore\b",
];

const RAGE: &[&str] = &[
    r"\b(?:kill|shoot|stab)\s+(?:him|her|them|everyone|everybody|people|my\s+\w+)\b",
    r"\bbring\s+a\s+(?:gun|knife)\s+to\s+school\b",
    r"\bshoot\s+up\s+(?:the\s+)?school\b",
    r"\bi['’]?m\s+going\s+to\s+hurt\s+(?:him|her|them|someone|somebody)\b",
    r"\bmake\s+them\s+(?:all\s+)?pay\b",
];

const ABUSE: &[&str] = &[
    r"\b(?:he|she|they|my\s+\w+)\s+(?:hits|beats|chokes|touches)\s+me\b",
    r"\b(?:being|been|getting)\s+(?:abused|molested|beaten)\b",
    r"\btouch(?:ed|es)?\s+me\s+(?:inappropriately|where)\b",
    r"\b(?:afraid|scared)\s+(?:to\s+go|of\s+going)\s+home\b",
];

/// Regex-table detector for self-harm, helplessness, rage and abuse.
pub struct CrisisDetector {
    table: Vec<(CrisisCategory, Regex)>,
}

impl CrisisDetector {
    pub fn new() -> Result<Self, regex::Error> {
        let table = [
            (CrisisCategory::SelfHarm, SELF_HARM),
            (CrisisCategory::Helplessness, HELPLESSNESS),
            (CrisisCategory::Rage, RAGE),
            (CrisisCategory::Abuse, ABUSE),
        ]
        .into_iter()
        .map(|(category, patterns)| Ok((category, alternation(patterns)?)))
        .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { table })
    }
}

/// One case-insensitive regex matching any of `patterns`.
fn alternation(patterns: &[&str]) -> Result<Regex, regex::Error> {
    let body = patterns
        .iter()
        .map(|p| format!("(?:{p})"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){body}"))
}

impl TextClassifier for CrisisDetector {
    type Category = CrisisCategory;

    fn classify(&self, text: &str) -> Option<Classification<CrisisCategory>> {
        self.table.iter().find_map(|(category, re)| {
            re.find(text).map(|m| Classification {
                category: *category,
                matched: m.as_str().to_owned(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Option<(CrisisCategory, String)> {
        CrisisDetector::new()
            .unwrap()
            .classify(text)
            .map(|c| (c.category, c.matched))
    }

    #[test]
    fn self_harm_returns_exact_substring() {
        let (cat, matched) = detect("honestly I want to kill myself today").unwrap();
        assert_eq!(cat, CrisisCategory::SelfHarm);
        assert_eq!(matched, "kill myself");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let (cat, matched) = detect("Sometimes I feel SUICIDAL").unwrap();
        assert_eq!(cat, CrisisCategory::SelfHarm);
        assert_eq!(matched, "SUICIDAL");
    }

    #[test]
    fn each_category_is_detected() {
        assert_eq!(
            detect("I can’t take it anymore").map(|d| d.0),
            Some(CrisisCategory::Helplessness)
        );
        assert_eq!(
            detect("I'm going to bring a gun to school").map(|d| d.0),
            Some(CrisisCategory::Rage)
        );
        assert_eq!(
            detect("my stepdad hits me when he is drunk").map(|d| d.0),
            Some(CrisisCategory::Abuse)
        );
    }

    #[test]
    fn earlier_category_wins() {
        let (cat, _) = detect("nobody cares and I want to die").unwrap();
        assert_eq!(cat, CrisisCategory::SelfHarm);
    }

    #[test]
    fn ordinary_schoolwork_is_clean() {
        for text in [
            "The character wanted to end the war quickly.",
            "Cells die when they run out of energy.",
            "I killed it on the quiz yesterday!",
            "Photosynthesis turns light into chemical energy.",
        ] {
            assert_eq!(detect(text), None, "{text}");
        }
    }
}
