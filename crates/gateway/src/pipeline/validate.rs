//! Structural checks on an inbound tutoring turn.
//!
//! Validation runs over the raw JSON value rather than a derived struct so
//! that every rejection names the exact field at fault. Nothing downstream
//! sees a request that failed here.

use serde_json::{Map, Value};
use tg_domain::config::TutorConfig;
use tg_domain::conversation::{ConversationTurn, LessonContext, PedagogicalMode, Role};

/// Lesson ids are slugs: alphanumeric first, then `[A-Za-z0-9_-]`.
const MAX_LESSON_ID_LEN: usize = 128;

/// A fully validated tutoring turn.
#[derive(Debug, Clone)]
pub struct TutorRequest {
    pub mode: PedagogicalMode,
    pub lesson_id: String,
    pub student_id: String,
    pub class_id: String,
    pub history: Vec<ConversationTurn>,
    pub message: String,
    pub lesson_context: LessonContext,
    pub exchange_count: u32,
    pub min_exchanges: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

type Checked<T> = Result<T, ValidationError>;

pub struct RequestValidator {
    limits: TutorConfig,
}

impl RequestValidator {
    pub fn new(limits: TutorConfig) -> Self {
        Self { limits }
    }

    pub fn validate(&self, body: &Value) -> Checked<TutorRequest> {
        let obj = body
            .as_object()
            .ok_or_else(|| ValidationError::new("body", "expected a JSON object"))?;

        let student_id = uuid_token(obj, "student_id")?;
        let class_id = uuid_token(obj, "class_id")?;
        let lesson_id = lesson_token(obj)?;
        let mode = PedagogicalMode::from(required_str(obj, "mode")?.to_owned());
        let message = self.message(obj)?;
        let history = self.history(obj)?;
        let lesson_context = self.lesson_context(obj)?;
        let exchange_count = bounded_int(obj, "exchange_count", 0, self.limits.max_exchange_count)?;
        let min_exchanges = bounded_int(
            obj,
            "min_exchanges",
            self.limits.min_exchanges_floor,
            self.limits.min_exchanges_ceiling,
        )?;

        Ok(TutorRequest {
            mode,
            lesson_id,
            student_id,
            class_id,
            history,
            message,
            lesson_context,
            exchange_count,
            min_exchanges,
        })
    }

    fn message(&self, obj: &Map<String, Value>) -> Checked<String> {
        let raw = required_str(obj, "message")?;
        if raw.trim().is_empty() {
            return Err(ValidationError::new("message", "must not be blank"));
        }
        let len = raw.chars().count();
        if len > self.limits.max_message_chars {
            return Err(ValidationError::new(
                "message",
                format!(
                    "is {len} characters; the limit is {}",
                    self.limits.max_message_chars
                ),
            ));
        }
        Ok(raw.to_owned())
    }

    fn history(&self, obj: &Map<String, Value>) -> Checked<Vec<ConversationTurn>> {
        let items = match obj.get("history") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(ValidationError::new("history", "must be an array")),
        };
        if items.len() > self.limits.max_history_turns {
            return Err(ValidationError::new(
                "history",
                format!(
                    "has {} turns; the limit is {}",
                    items.len(),
                    self.limits.max_history_turns
                ),
            ));
        }

        items
            .iter()
            .enumerate()
            .map(|(idx, item)| -> Checked<ConversationTurn> {
                let field = |name: &str| format!("history[{idx}].{name}");
                let turn = item
                    .as_object()
                    .ok_or_else(|| ValidationError::new(format!("history[{idx}]"), "must be an object"))?;
                let role = turn
                    .get("role")
                    .and_then(Value::as_str)
                    .and_then(Role::parse)
                    .ok_or_else(|| ValidationError::new(field("role"), "must be \"user\" or \"assistant\""))?;
                let content = turn
                    .get("content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ValidationError::new(field("content"), "must be a string"))?;
                Ok(ConversationTurn::new(role, content, self.limits.max_message_chars))
            })
            .collect()
    }

    fn lesson_context(&self, obj: &Map<String, Value>) -> Checked<LessonContext> {
        let ctx = match obj.get("lesson_context") {
            None | Some(Value::Null) => return Ok(LessonContext::default()),
            Some(Value::Object(ctx)) => ctx,
            Some(_) => return Err(ValidationError::new("lesson_context", "must be an object")),
        };
        let text = |name: &str| -> Checked<String> {
            let field = format!("lesson_context.{name}");
            match ctx.get(name) {
                None | Some(Value::Null) => Ok(String::new()),
                Some(Value::String(s)) if s.chars().count() <= self.limits.max_context_chars => {
                    Ok(s.clone())
                }
                Some(Value::String(_)) => Err(ValidationError::new(
                    field,
                    format!("exceeds {} characters", self.limits.max_context_chars),
                )),
                Some(_) => Err(ValidationError::new(field, "must be a string")),
            }
        };
        Ok(LessonContext {
            skill_name: text("skill_name")?,
            compelling_question: text("compelling_question")?,
        })
    }
}

fn required_str<'a>(obj: &'a Map<String, Value>, field: &str) -> Checked<&'a str> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.as_str()),
        None | Some(Value::Null) => Err(ValidationError::new(field, "is required")),
        Some(_) => Err(ValidationError::new(field, "must be a string")),
    }
}

/// Hyphenated 8-4-4-4-12 UUID only; braced, URN and simple forms are refused.
fn uuid_token(obj: &Map<String, Value>, field: &str) -> Checked<String> {
    let raw = required_str(obj, field)?;
    if raw.len() == 36 && uuid::Uuid::parse_str(raw).is_ok() {
        Ok(raw.to_owned())
    } else {
        Err(ValidationError::new(field, "must be a hyphenated UUID"))
    }
}

fn lesson_token(obj: &Map<String, Value>) -> Checked<String> {
    let raw = required_str(obj, "lesson_id")?;
    let mut chars = raw.chars();
    let well_formed = raw.len() <= MAX_LESSON_ID_LEN
        && chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if well_formed {
        Ok(raw.to_owned())
    } else {
        Err(ValidationError::new(
            "lesson_id",
            "must be 1-128 characters of [A-Za-z0-9_-] starting with a letter or digit",
        ))
    }
}

fn bounded_int(obj: &Map<String, Value>, field: &str, min: u32, max: u32) -> Checked<u32> {
    let out_of_range = || ValidationError::new(field, format!("must be an integer in {min}..={max}"));
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationError::new(field, "is required")),
        Some(v) => {
            let n = v.as_u64().ok_or_else(out_of_range)?;
            u32::try_from(n)
                .ok()
                .filter(|n| (min..=max).contains(n))
                .ok_or_else(out_of_range)
        }
    }
}
