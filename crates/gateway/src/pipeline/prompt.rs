//! Mode-specific tutoring instructions and the generator payload.

use tg_domain::config::TutorConfig;
use tg_domain::conversation::{ConversationTurn, LessonContext, PedagogicalMode};
use tg_providers::ChatRequest;

const GROUND_RULES: &str = "\
You are a patient, encouraging tutor talking with a middle or high school student.
Never hand over the answer. Ask one question at a time and keep each reply under 120 words.
Build on what the student actually said, and ask them to explain their reasoning.
Lesson skill: {skill_name}
Compelling question: {compelling_question}";

const COMPLETION_RULE: &str = "\
The student must complete at least {min_exchanges} exchanges with you. Only once they have \
and they have shown real understanding, end your final reply with the exact marker {sentinel}. \
Never mention or explain the marker.";

const DO_NOW: &str = "\
This is a Do Now warm-up at the start of class. Open with a short, low-stakes question that \
connects the compelling question to something the student already knows. Keep the tone light \
and curious, and help them activate prior knowledge rather than teaching new material.";

const EXIT_TICKET: &str = "\
This is an Exit Ticket at the end of the lesson. Check what the student understood about the \
skill. Ask them to state the key idea in their own words and apply it to one quick example. \
If something is missing or mistaken, probe with a follow-up question instead of correcting it \
outright.";

const REFLECTION: &str = "\
This is a Reflection. Help the student think about how they learned, not just what they \
learned: what was hard, what strategy helped, and what they would try differently. Ask open \
questions and invite specific examples from today's work.";

const SKILL_PRACTICE: &str = "\
This is Skill Practice. Give the student one practice problem at a time on the lesson skill. \
When they answer, ask them to justify each step. If they are stuck, offer the smallest useful \
hint, then let them try again before moving on.";

const DEFAULT_TEMPLATE: &str = "\
Guide the student through a short Socratic conversation about the compelling question, \
checking their understanding of the lesson skill as you go.";

/// Selects one template per request and interpolates lesson context.
pub struct PromptComposer {
    sentinel: String,
    max_turn_chars: usize,
}

impl PromptComposer {
    pub fn new(cfg: &TutorConfig) -> Self {
        Self {
            sentinel: cfg.completion_sentinel.clone(),
            max_turn_chars: cfg.max_message_chars,
        }
    }

    pub fn compose(
        &self,
        mode: &PedagogicalMode,
        ctx: &LessonContext,
        min_exchanges: u32,
    ) -> String {
        let body = match mode {
            PedagogicalMode::DoNow => DO_NOW,
            PedagogicalMode::ExitTicket => EXIT_TICKET,
            PedagogicalMode::Reflection => REFLECTION,
            PedagogicalMode::SkillPractice => SKILL_PRACTICE,
            PedagogicalMode::Unrecognized(raw) => {
                tracing::debug!(mode = %raw, "unrecognized mode, using default template");
                DEFAULT_TEMPLATE
            }
        };

        let skill = or_neutral(&ctx.skill_name, "today's skill");
        let question = or_neutral(&ctx.compelling_question, "the big question of this lesson");

        [GROUND_RULES, body, COMPLETION_RULE]
            .join("\n\n")
            .replace("{skill_name}", skill)
            .replace("{compelling_question}", question)
            .replace("{min_exchanges}", &min_exchanges.to_string())
            .replace("{sentinel}", &self.sentinel)
    }

    /// Instructions plus re-truncated history, then the new user turn.
    pub fn build_payload(
        &self,
        instructions: String,
        history: &[ConversationTurn],
        message: &str,
    ) -> ChatRequest {
        let mut messages: Vec<ConversationTurn> = history
            .iter()
            .map(|t| ConversationTurn::new(t.role(), t.content(), self.max_turn_chars))
            .collect();
        messages.push(ConversationTurn::user(message, self.max_turn_chars));

        ChatRequest {
            system: instructions,
            messages,
            ..ChatRequest::default()
        }
    }
}

fn or_neutral<'a>(value: &'a str, neutral: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        neutral
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_domain::conversation::Role;

    fn composer() -> PromptComposer {
        PromptComposer::new(&TutorConfig::default())
    }

    fn ctx() -> LessonContext {
        LessonContext {
            skill_name: "Equivalent fractions".into(),
            compelling_question: "Why can two fractions name the same amount?".into(),
        }
    }

    #[test]
    fn each_mode_selects_its_own_template() {
        let c = composer();
        let do_now = c.compose(&PedagogicalMode::DoNow, &ctx(), 5);
        let exit = c.compose(&PedagogicalMode::ExitTicket, &ctx(), 5);
        let reflect = c.compose(&PedagogicalMode::Reflection, &ctx(), 5);
        let practice = c.compose(&PedagogicalMode::SkillPractice, &ctx(), 5);
        assert!(do_now.contains("Do Now"));
        assert!(exit.contains("Exit Ticket"));
        assert!(reflect.contains("Reflection"));
        assert!(practice.contains("Skill Practice"));
        assert!(!do_now.contains("Exit Ticket"));
    }

    #[test]
    fn unknown_mode_falls_back_to_default() {
        let prompt = composer().compose(
            &PedagogicalMode::Unrecognized("gallery_walk".into()),
            &ctx(),
            3,
        );
        assert!(prompt.contains("Socratic conversation"));
    }

    #[test]
    fn placeholders_are_interpolated() {
        let prompt = composer().compose(&PedagogicalMode::Reflection, &ctx(), 7);
        assert!(prompt.contains("Equivalent fractions"));
        assert!(prompt.contains("Why can two fractions name the same amount?"));
        assert!(prompt.contains("at least 7 exchanges"));
        assert!(prompt.contains("[SESSION_COMPLETE]"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn blank_context_uses_neutral_wording() {
        let prompt =
            composer().compose(&PedagogicalMode::DoNow, &LessonContext::default(), 5);
        assert!(prompt.contains("Lesson skill: today's skill"));
        assert!(prompt.contains("the big question of this lesson"));
    }

    #[test]
    fn payload_appends_new_turn_after_history() {
        let cfg = TutorConfig {
            max_message_chars: 5,
            ..TutorConfig::default()
        };
        let c = PromptComposer::new(&cfg);
        let history = vec![
            ConversationTurn::assistant("Hello", 100),
            ConversationTurn::user("abcdefgh", 100),
        ];
        let req = c.build_payload("sys".into(), &history, "my answer");
        assert_eq!(req.system, "sys");
        assert_eq!(req.messages.len(), 3);
        assert_eq!(req.messages[1].content(), "abcde");
        assert_eq!(req.messages[2].role(), Role::User);
        assert_eq!(req.messages[2].content(), "my an");
    }
}
