//! The tutoring request pipeline.
//!
//! validate → identity match → rate-limit → crisis → quality → compose → generate →
//! complete → dispatch. Every stage before generation may answer on its
//! own; nothing after it runs unless all gates pass.

pub mod classify;
pub mod completion;
pub mod dispatch;
pub mod generation;
pub mod prompt;
pub mod rate_limit;
pub mod validate;

use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::Value;
use tg_domain::config::Config;
use tg_domain::conversation::{ConversationTurn, Role};
use tg_domain::records::{AlertStatus, CrisisAlert, CrisisCategory, SessionRecord, UsageIncrement};
use tg_domain::trace::TraceEvent;
use uuid::Uuid;

use classify::{Classification, CrisisDetector, QualityGate, QualityVerdict, TextClassifier};
use completion::CompletionEvaluator;
use dispatch::SideEffectDispatcher;
use generation::{GenerationGateway, GenerationOutcome, STILL_THINKING_MESSAGE};
use prompt::PromptComposer;
use rate_limit::{FixedWindowLimiter, RouteClass};
use validate::{RequestValidator, TutorRequest, ValidationError};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Canned replies
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const SAFETY_MESSAGE: &str = "\
It sounds like you might be going through something really hard right now, and I'm glad you \
said something. You are not alone, and you deserve support from a real person.

- Call or text 988 (Suicide & Crisis Lifeline), any time, day or night.
- Text HOME to 741741 to reach the Crisis Text Line.
- Call 1-800-422-4453 (Childhelp National Child Abuse Hotline) if someone is hurting you.
- If you are in immediate danger, call 911.

Please also talk to your teacher, a school counselor, or another adult you trust. \
We're pausing this tutoring conversation for now. Your teacher has been notified so they can check in with you.";

pub const OWN_WORDS_MESSAGE: &str = "\
This reads like it was written by someone (or something) else. I want to hear your thinking \
in your own words, even if it isn't perfect. How would you explain it?";

const PUSH_BACKS: &[&str] = &[
    "Tell me a bit more. What makes you think that?",
    "I want to hear your thinking! Can you answer in a full sentence or two?",
    "That's a start. Can you add a reason or an example?",
    "Give it another try with a little more detail. What do you notice?",
    "It's okay not to be sure. What is one thing you do know about this?",
];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outcomes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReply {
    pub message: String,
    pub should_complete: bool,
    pub response_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrisisReply {
    pub message: String,
    pub crisis_detected: bool,
    pub should_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TutorReply {
    Turn(TurnReply),
    Crisis(CrisisReply),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("tutoring is not configured")]
    NotConfigured,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("student_id does not belong to the caller")]
    ForeignStudent,
    #[error("rate limited; retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("generation failed: {0}")]
    Generation(#[from] generation::GenerationError),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pipeline
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct TutorPipeline {
    validator: RequestValidator,
    limiter: Arc<FixedWindowLimiter>,
    crisis: CrisisDetector,
    quality: QualityGate,
    composer: PromptComposer,
    generator: Option<GenerationGateway>,
    completion: CompletionEvaluator,
    dispatcher: SideEffectDispatcher,
    crisis_context_turns: usize,
    max_turn_chars: usize,
}

impl TutorPipeline {
    pub fn new(
        config: &Config,
        limiter: Arc<FixedWindowLimiter>,
        generator: Option<GenerationGateway>,
        dispatcher: SideEffectDispatcher,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            validator: RequestValidator::new(config.tutor.clone()),
            limiter,
            crisis: CrisisDetector::new()?,
            quality: QualityGate::new(&config.quality)?,
            composer: PromptComposer::new(&config.tutor),
            generator,
            completion: CompletionEvaluator::new(config.tutor.completion_sentinel.clone()),
            dispatcher,
            crisis_context_turns: config.tutor.crisis_context_turns,
            max_turn_chars: config.tutor.max_message_chars,
        })
    }

    pub fn generator_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Run one student turn for the authenticated `caller`.
    pub async fn handle(&self, caller: &str, body: &Value) -> Result<TutorReply, PipelineError> {
        let generator = self.generator.as_ref().ok_or(PipelineError::NotConfigured)?;
        let req = self.validator.validate(body)?;
        if req.student_id != caller {
            tracing::warn!(lesson_id = %req.lesson_id, "student_id does not match caller identity");
            return Err(PipelineError::ForeignStudent);
        }

        let decision = self.limiter.check(caller, RouteClass::Tutor);
        if !decision.allowed {
            let retry_after_secs = decision.retry_after_secs();
            TraceEvent::RateLimited {
                route_class: RouteClass::Tutor.as_str().into(),
                retry_after_secs,
            }
            .emit();
            return Err(PipelineError::RateLimited { retry_after_secs });
        }

        if let Some((source, hit)) = self.scan_for_crisis(&req) {
            tracing::warn!(
                category = hit.category.as_str(),
                source,
                lesson_id = %req.lesson_id,
                "crisis language detected, tutoring paused"
            );
            short_circuit("crisis", hit.category.as_str(), req.exchange_count);
            let context = self.context_snapshot(&req);
            self.dispatcher.crisis_alert(CrisisAlert {
                id: Uuid::new_v4(),
                student_id: req.student_id,
                class_id: req.class_id,
                lesson_id: req.lesson_id,
                category: hit.category,
                trigger_text: hit.matched,
                context,
                status: AlertStatus::Unread,
                created_at: Utc::now(),
            });
            return Ok(TutorReply::Crisis(CrisisReply {
                message: SAFETY_MESSAGE.to_owned(),
                crisis_detected: true,
                should_complete: false,
            }));
        }

        match self
            .quality
            .evaluate(&req.message, req.exchange_count, req.min_exchanges)
        {
            QualityVerdict::Pass => {}
            QualityVerdict::LowEffort(hit) => {
                short_circuit("low_effort", hit.category.as_str(), req.exchange_count);
                let message = PUSH_BACKS
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(PUSH_BACKS[0]);
                return Ok(held(message, req.exchange_count));
            }
            QualityVerdict::Generated(_) => {
                short_circuit("generated_text", "fingerprint", req.exchange_count);
                return Ok(held(OWN_WORDS_MESSAGE, req.exchange_count));
            }
        }

        let instructions = self
            .composer
            .compose(&req.mode, &req.lesson_context, req.min_exchanges);
        let payload = self
            .composer
            .build_payload(instructions, &req.history, &req.message);

        let reply = match generator.generate(payload).await {
            Ok(GenerationOutcome::Reply(text)) => text,
            Ok(GenerationOutcome::StillThinking) => {
                tracing::info!(provider = generator.provider_id(), "generation timed out");
                return Ok(held(STILL_THINKING_MESSAGE, req.exchange_count));
            }
            Err(e) => {
                tracing::error!(provider = generator.provider_id(), error = %e, "generation failed");
                return Err(e.into());
            }
        };

        let verdict = self
            .completion
            .evaluate(&reply, req.exchange_count, req.min_exchanges);

        self.dispatcher.usage(UsageIncrement::today(&req.student_id));
        if verdict.should_complete {
            TraceEvent::EpisodeCompleted {
                mode: req.mode.to_string(),
                exchange_count: verdict.response_count,
            }
            .emit();
            self.dispatcher.session(self.session_record(req, &verdict.message, verdict.response_count));
        }

        Ok(TutorReply::Turn(TurnReply {
            message: verdict.message,
            should_complete: verdict.should_complete,
            response_count: verdict.response_count,
        }))
    }

    /// Every piece of student text that would be forwarded to the
    /// generator: the new message first, then user turns newest to oldest.
    fn scan_for_crisis(
        &self,
        req: &TutorRequest,
    ) -> Option<(&'static str, Classification<CrisisCategory>)> {
        if let Some(hit) = self.crisis.classify(&req.message) {
            return Some(("message", hit));
        }
        req.history
            .iter()
            .rev()
            .filter(|t| t.role() == Role::User)
            .find_map(|t| self.crisis.classify(t.content()))
            .map(|hit| ("history", hit))
    }

    /// The last `crisis_context_turns` turns, new user turn included.
    fn context_snapshot(&self, req: &TutorRequest) -> Vec<ConversationTurn> {
        let keep = self.crisis_context_turns;
        if keep == 0 {
            return Vec::new();
        }
        let from_history = keep - 1;
        let skip = req.history.len().saturating_sub(from_history);
        req.history[skip..]
            .iter()
            .cloned()
            .chain(std::iter::once(ConversationTurn::user(&req.message, self.max_turn_chars)))
            .collect()
    }

    fn session_record(&self, req: TutorRequest, reply: &str, exchange_count: u32) -> SessionRecord {
        let mut transcript = req.history;
        transcript.push(ConversationTurn::user(&req.message, self.max_turn_chars));
        transcript.push(ConversationTurn::assistant(reply, self.max_turn_chars));
        SessionRecord {
            id: Uuid::new_v4(),
            student_id: req.student_id,
            lesson_id: req.lesson_id,
            class_id: req.class_id,
            mode: req.mode,
            transcript,
            exchange_count,
            completed_at: Utc::now(),
        }
    }
}

/// A reply that leaves the exchange counter where it was.
fn held(message: &str, exchange_count: u32) -> TutorReply {
    TutorReply::Turn(TurnReply {
        message: message.to_owned(),
        should_complete: false,
        response_count: exchange_count,
    })
}

fn short_circuit(gate: &str, reason: &str, exchange_count: u32) {
    TraceEvent::GateShortCircuit {
        gate: gate.into(),
        reason: reason.into(),
        exchange_count,
    }
    .emit();
}
