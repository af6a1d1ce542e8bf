use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::model::{AnswerMap, Question, Section, WritingResponses, WritingTask};
use crate::scoring::percentage;

/// Identifier of a practice topic within a section's question bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Essays and task prompts of a writing attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingSnapshot {
    pub responses: WritingResponses,
    pub tasks: Vec<WritingTask>,
}

/// Record of one completed practice attempt, kept for the review screen.
///
/// Carries snapshots of the answers and questions so the attempt can be
/// replayed even after the bank changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub topic_id: TopicId,
    pub section: Section,
    pub score: u32,
    pub total: u32,
    pub percentage: u8,
    pub completed_at: DateTime<Utc>,
    pub time_spent_secs: u64,
    #[serde(default)]
    pub answers: AnswerMap,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Present for writing attempts, whose answers are free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writing: Option<WritingSnapshot>,
}

impl HistoryEntry {
    /// Builds an entry, deriving `percentage` from `score / total`.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        topic_id: TopicId,
        section: Section,
        score: u32,
        total: u32,
        completed_at: DateTime<Utc>,
        time_spent_secs: u64,
        answers: AnswerMap,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            id,
            topic_id,
            section,
            score,
            total,
            percentage: percentage(score, total),
            completed_at,
            time_spent_secs,
            answers,
            questions,
            writing: None,
        }
    }

    #[must_use]
    pub fn with_writing(mut self, snapshot: WritingSnapshot) -> Self {
        self.writing = Some(snapshot);
        self
    }
}
