//! Conversation model shared by the gateway and the record stores.

use std::fmt;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Turns
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One chat turn. Content is capped at construction and never mutated;
/// there is no `Deserialize` impl, only [`ConversationTurn::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationTurn {
    role: Role,
    content: String,
}

impl ConversationTurn {
    /// Build a turn, truncating `content` to at most `max_chars` characters.
    pub fn new(role: Role, content: &str, max_chars: usize) -> Self {
        Self {
            role,
            content: truncate_chars(content, max_chars).to_owned(),
        }
    }

    pub fn user(content: &str, max_chars: usize) -> Self {
        Self::new(Role::User, content, max_chars)
    }

    pub fn assistant(content: &str, max_chars: usize) -> Self {
        Self::new(Role::Assistant, content, max_chars)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Longest prefix of `s` holding at most `max_chars` chars.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pedagogical modes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The tutoring strategy requested by the lesson screen.
///
/// Unknown strings are kept as `Unrecognized` so the prompt composer can
/// fall back to its default template instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PedagogicalMode {
    /// Warm-up question at the start of class.
    DoNow,
    /// End-of-lesson check for understanding.
    ExitTicket,
    /// Metacognitive reflection on how the student learned.
    Reflection,
    /// Guided practice on the lesson's skill.
    SkillPractice,
    Unrecognized(String),
}

impl PedagogicalMode {
    /// Every recognised mode, in display order.
    pub const KNOWN: [PedagogicalMode; 4] = [
        PedagogicalMode::DoNow,
        PedagogicalMode::ExitTicket,
        PedagogicalMode::Reflection,
        PedagogicalMode::SkillPractice,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            PedagogicalMode::DoNow => "do_now",
            PedagogicalMode::ExitTicket => "exit_ticket",
            PedagogicalMode::Reflection => "reflection",
            PedagogicalMode::SkillPractice => "skill_practice",
            PedagogicalMode::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, PedagogicalMode::Unrecognized(_))
    }
}

impl From<String> for PedagogicalMode {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "do_now" => PedagogicalMode::DoNow,
            "exit_ticket" => PedagogicalMode::ExitTicket,
            "reflection" => PedagogicalMode::Reflection,
            "skill_practice" => PedagogicalMode::SkillPractice,
            _ => PedagogicalMode::Unrecognized(raw),
        }
    }
}

impl From<PedagogicalMode> for String {
    fn from(mode: PedagogicalMode) -> Self {
        mode.as_str().to_owned()
    }
}

impl fmt::Display for PedagogicalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Lesson context
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Free-text lesson framing supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonContext {
    #[serde(default)]
    pub skill_name: String,
    #[serde(default)]
    pub compelling_question: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn turn_is_capped_on_ingestion() {
        let turn = ConversationTurn::user("abcdef", 4);
        assert_eq!(turn.content(), "abcd");
        assert_eq!(turn.role(), Role::User);
    }

    #[test]
    fn mode_round_trips_through_strings() {
        let mode: PedagogicalMode = serde_json::from_str("\"exit_ticket\"").unwrap();
        assert_eq!(mode, PedagogicalMode::ExitTicket);
        let other: PedagogicalMode = serde_json::from_str("\"gallery_walk\"").unwrap();
        assert_eq!(other, PedagogicalMode::Unrecognized("gallery_walk".into()));
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"gallery_walk\"");
    }

    #[test]
    fn turn_serializes_as_role_and_content() {
        let turn = ConversationTurn::assistant("hi", 10);
        let v = serde_json::to_value(&turn).unwrap();
        assert_eq!(v, serde_json::json!({"role": "assistant", "content": "hi"}));
    }
}
