use serde::{Deserialize, Serialize};

use crate::model::{ExamKind, Section};

//
// ─── CHOICE QUESTIONS ──────────────────────────────────────────────────────────
//

/// A labeled option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: char,
    pub text: String,
}

impl Choice {
    #[must_use]
    pub fn new(label: char, text: impl Into<String>) -> Self {
        Self {
            label,
            text: text.into(),
        }
    }
}

/// Immutable multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    prompt: String,
    choices: Vec<Choice>,
    correct: char,
}

impl Question {
    #[must_use]
    pub fn new(prompt: impl Into<String>, choices: Vec<Choice>, correct: char) -> Self {
        Self {
            prompt: prompt.into(),
            choices,
            correct,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    #[must_use]
    pub fn correct(&self) -> char {
        self.correct
    }

    #[must_use]
    pub fn is_correct(&self, label: char) -> bool {
        self.correct == label
    }
}

//
// ─── WRITING TASKS ─────────────────────────────────────────────────────────────
//

/// Free-text task scored on completion against a minimum word count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingTask {
    prompt: String,
    min_words: u32,
    weight: u32,
}

impl WritingTask {
    /// IELTS Task 1 minimum.
    pub const TASK_ONE_MIN_WORDS: u32 = 150;
    /// IELTS Task 2 minimum.
    pub const TASK_TWO_MIN_WORDS: u32 = 250;

    #[must_use]
    pub fn new(prompt: impl Into<String>, min_words: u32, weight: u32) -> Self {
        Self {
            prompt: prompt.into(),
            min_words,
            weight,
        }
    }

    /// Report/letter task: 150 words, single weight.
    #[must_use]
    pub fn task_one(prompt: impl Into<String>) -> Self {
        Self::new(prompt, Self::TASK_ONE_MIN_WORDS, 1)
    }

    /// Essay task: 250 words, counts double.
    #[must_use]
    pub fn task_two(prompt: impl Into<String>) -> Self {
        Self::new(prompt, Self::TASK_TWO_MIN_WORDS, 2)
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn min_words(&self) -> u32 {
        self.min_words
    }

    #[must_use]
    pub fn weight(&self) -> u32 {
        self.weight
    }
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Content of one section: either choice questions or writing tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionContent {
    Choice(Vec<Question>),
    Writing(Vec<WritingTask>),
}

impl SectionContent {
    /// Number of navigable items (questions or tasks).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            SectionContent::Choice(questions) => questions.len(),
            SectionContent::Writing(tasks) => tasks.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        match self {
            SectionContent::Choice(questions) => questions,
            SectionContent::Writing(_) => &[],
        }
    }

    #[must_use]
    pub fn tasks(&self) -> &[WritingTask] {
        match self {
            SectionContent::Writing(tasks) => tasks,
            SectionContent::Choice(_) => &[],
        }
    }
}

/// Static, ordered question set for one exam kind.
///
/// Supplied by the caller and never mutated by sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    exam: ExamKind,
    sections: Vec<(Section, SectionContent)>,
}

impl QuestionBank {
    #[must_use]
    pub fn new(exam: ExamKind) -> Self {
        Self {
            exam,
            sections: Vec::new(),
        }
    }

    /// Adds or replaces the content for `section`.
    #[must_use]
    pub fn with_section(mut self, section: Section, content: SectionContent) -> Self {
        match self.sections.iter_mut().find(|(s, _)| *s == section) {
            Some(slot) => slot.1 = content,
            None => self.sections.push((section, content)),
        }
        self
    }

    #[must_use]
    pub fn exam(&self) -> ExamKind {
        self.exam
    }

    #[must_use]
    pub fn content(&self, section: Section) -> Option<&SectionContent> {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, content)| content)
    }

    pub fn sections(&self) -> impl Iterator<Item = Section> + '_ {
        self.sections.iter().map(|(s, _)| *s)
    }
}
