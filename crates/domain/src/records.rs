//! Write payloads handed to the storage collaborator.
//!
//! The schema is owned by the storage service; these structs only describe
//! what the gateway sends.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::conversation::{ConversationTurn, PedagogicalMode};

/// Crisis categories, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisCategory {
    SelfHarm,
    Helplessness,
    Rage,
    Abuse,
}

impl CrisisCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrisisCategory::SelfHarm => "self_harm",
            CrisisCategory::Helplessness => "helplessness",
            CrisisCategory::Rage => "rage",
            CrisisCategory::Abuse => "abuse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Unread,
    Read,
}

/// Raised for a teacher/counsellor when crisis language is detected.
/// Created once; never updated by the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct CrisisAlert {
    pub id: Uuid,
    pub student_id: String,
    pub class_id: String,
    pub lesson_id: String,
    pub category: CrisisCategory,
    pub trigger_text: String,
    pub context: Vec<ConversationTurn>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
}

/// Transcript of a completed tutoring episode.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub student_id: String,
    pub lesson_id: String,
    pub class_id: String,
    pub mode: PedagogicalMode,
    pub transcript: Vec<ConversationTurn>,
    pub exchange_count: u32,
    pub completed_at: DateTime<Utc>,
}

/// One tick of the per-student daily usage counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageIncrement {
    pub student_id: String,
    pub date: NaiveDate,
    pub delta: u32,
}

impl UsageIncrement {
    /// A single request for `student_id` on today's UTC date.
    pub fn today(student_id: &str) -> Self {
        Self {
            student_id: student_id.to_owned(),
            date: Utc::now().date_naive(),
            delta: 1,
        }
    }
}
