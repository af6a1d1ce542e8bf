use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{ExamKind, Question, Section};

//
// ─── ANSWER MAP ────────────────────────────────────────────────────────────────
//

/// Chosen labels keyed by zero-based question index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<usize, char>);

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the answer for `index`.
    pub fn record(&mut self, index: usize, label: char) {
        self.0.insert(index, label);
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<char> {
        self.0.get(&index).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, char)> + '_ {
        self.0.iter().map(|(i, c)| (*i, *c))
    }

    /// Number of answers matching the correct label of their question.
    ///
    /// Indices without a question are ignored.
    #[must_use]
    pub fn correct_count(&self, questions: &[Question]) -> u32 {
        let hits = questions
            .iter()
            .enumerate()
            .filter(|(i, q)| self.get(*i).is_some_and(|label| q.is_correct(label)))
            .count();
        u32::try_from(hits).unwrap_or(u32::MAX)
    }
}

impl FromIterator<(usize, char)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (usize, char)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Free-text responses keyed by writing task index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WritingResponses(BTreeMap<usize, String>);

impl WritingResponses {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, task: usize, text: impl Into<String>) {
        self.0.insert(task, text.into());
    }

    #[must_use]
    pub fn get(&self, task: usize) -> Option<&str> {
        self.0.get(&task).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

//
// ─── EXAM ANSWERS ──────────────────────────────────────────────────────────────
//

/// Per-exam answer shape.
///
/// Serialized with an `examType` tag; the remote result store receives it as
/// an opaque blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "examType", rename_all = "snake_case")]
pub enum ExamAnswers {
    Ielts {
        listening: AnswerMap,
        reading: AnswerMap,
        writing: WritingResponses,
    },
    ToeflItp {
        listening: AnswerMap,
        structure: AnswerMap,
        reading: AnswerMap,
    },
}

impl ExamAnswers {
    #[must_use]
    pub fn empty(exam: ExamKind) -> Self {
        match exam {
            ExamKind::Ielts => Self::Ielts {
                listening: AnswerMap::new(),
                reading: AnswerMap::new(),
                writing: WritingResponses::new(),
            },
            ExamKind::ToeflItp => Self::ToeflItp {
                listening: AnswerMap::new(),
                structure: AnswerMap::new(),
                reading: AnswerMap::new(),
            },
        }
    }

    #[must_use]
    pub fn exam(&self) -> ExamKind {
        match self {
            ExamAnswers::Ielts { .. } => ExamKind::Ielts,
            ExamAnswers::ToeflItp { .. } => ExamKind::ToeflItp,
        }
    }

    /// Answer map of a choice section, `None` for writing or foreign sections.
    #[must_use]
    pub fn choices(&self, section: Section) -> Option<&AnswerMap> {
        match (self, section) {
            (ExamAnswers::Ielts { listening, .. }, Section::Listening)
            | (ExamAnswers::ToeflItp { listening, .. }, Section::Listening) => Some(listening),
            (ExamAnswers::Ielts { reading, .. }, Section::Reading)
            | (ExamAnswers::ToeflItp { reading, .. }, Section::Reading) => Some(reading),
            (ExamAnswers::ToeflItp { structure, .. }, Section::Structure) => Some(structure),
            _ => None,
        }
    }

    pub fn choices_mut(&mut self, section: Section) -> Option<&mut AnswerMap> {
        match (self, section) {
            (ExamAnswers::Ielts { listening, .. }, Section::Listening)
            | (ExamAnswers::ToeflItp { listening, .. }, Section::Listening) => Some(listening),
            (ExamAnswers::Ielts { reading, .. }, Section::Reading)
            | (ExamAnswers::ToeflItp { reading, .. }, Section::Reading) => Some(reading),
            (ExamAnswers::ToeflItp { structure, .. }, Section::Structure) => Some(structure),
            _ => None,
        }
    }

    #[must_use]
    pub fn writing(&self) -> Option<&WritingResponses> {
        match self {
            ExamAnswers::Ielts { writing, .. } => Some(writing),
            ExamAnswers::ToeflItp { .. } => None,
        }
    }

    pub fn writing_mut(&mut self) -> Option<&mut WritingResponses> {
        match self {
            ExamAnswers::Ielts { writing, .. } => Some(writing),
            ExamAnswers::ToeflItp { .. } => None,
        }
    }

    /// Total recorded answers across all sections.
    #[must_use]
    pub fn answered(&self) -> usize {
        match self {
            ExamAnswers::Ielts {
                listening,
                reading,
                writing,
            } => listening.len() + reading.len() + writing.len(),
            ExamAnswers::ToeflItp {
                listening,
                structure,
                reading,
            } => listening.len() + structure.len() + reading.len(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::empty(self.exam());
    }
}
