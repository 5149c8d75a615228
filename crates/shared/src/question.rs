//! Quiz question record
//!
//! Only the fields the read projection needs. `correct_answer` is the
//! sensitive index that unauthenticated callers must never see.

use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: Option<i32>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: Option<i32>,
}

impl Question {
    pub fn from_new(new: NewQuestion, now: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: new.question,
            options: new.options,
            correct_answer: new.correct_answer,
            created_at: now,
        }
    }
}
