//! Exam session state machine.
//!
//! A session starts in [`SessionPhase::Answering`], moves to
//! [`SessionPhase::Results`] on submission (manual or countdown expiry) and
//! only returns to answering through [`ExamSession::retake`], which clears all
//! answers.

mod progress;

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{
    ExamAnswers, ExamKind, ExamMode, ExamSettings, HistoryEntry, QuestionBank, Section,
    SectionContent, TopicId, WritingSnapshot,
};
use crate::scoring::{self, ScoreReport};
use crate::time::elapsed_secs;

pub use progress::SessionProgress;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already completed")]
    Completed,
    #[error("section {0} is not part of this session")]
    UnknownSection(Section),
    #[error("question bank has no content for section {0}")]
    MissingSection(Section),
    #[error("question bank section {0} does not belong to this exam")]
    ForeignSection(Section),
    #[error("question bank is for {bank}, session is for {session}")]
    BankMismatch { bank: ExamKind, session: ExamKind },
    #[error("question bank content for section {0} has the wrong shape")]
    ContentMismatch(Section),
    #[error("session has no sections")]
    EmptyExam,
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub exam: ExamKind,
    pub mode: ExamMode,
    pub time_limit_secs: Option<u32>,
}

impl SessionConfig {
    /// Full timed exam with the official durations.
    #[must_use]
    pub fn mock(exam: ExamKind, settings: &ExamSettings) -> Self {
        Self {
            exam,
            mode: ExamMode::Mock,
            time_limit_secs: Some(settings.mock_time_limit_secs(exam)),
        }
    }

    /// Untimed single-section practice on one topic.
    #[must_use]
    pub fn practice(exam: ExamKind, topic_id: TopicId, section: Section) -> Self {
        Self {
            exam,
            mode: ExamMode::Practice { topic_id, section },
            time_limit_secs: None,
        }
    }

    #[must_use]
    pub fn with_time_limit(mut self, secs: Option<u32>) -> Self {
        self.time_limit_secs = secs;
        self
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Answering,
    Results,
}

/// Result of [`ExamSession::submit`].
///
/// Only `Fresh` submissions should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission<'a> {
    Fresh(&'a ScoreReport),
    AlreadySubmitted(&'a ScoreReport),
}

impl<'a> Submission<'a> {
    #[must_use]
    pub fn report(self) -> &'a ScoreReport {
        match self {
            Submission::Fresh(report) | Submission::AlreadySubmitted(report) => report,
        }
    }

    #[must_use]
    pub fn is_fresh(self) -> bool {
        matches!(self, Submission::Fresh(_))
    }
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session has no time limit.
    Untimed,
    /// The session was already in results; nothing changed.
    Finished,
    Running { remaining_secs: u32 },
    /// Time ran out and the session was submitted by this tick.
    Expired,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One exam attempt owned by the calling component.
pub struct ExamSession {
    config: SessionConfig,
    bank: Arc<QuestionBank>,
    sections: Vec<Section>,
    current_section: Section,
    position: usize,
    answers: ExamAnswers,
    remaining_secs: Option<u32>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    time_spent_secs: Option<u64>,
    report: Option<ScoreReport>,
}

impl ExamSession {
    /// Start a session in the answering state.
    ///
    /// `started_at` should come from the caller's clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::BankMismatch` or `SessionError::ForeignSection` if
    /// the bank does not belong to the exam, `SessionError::UnknownSection` if a
    /// practice section is not part of the exam, `SessionError::ContentMismatch`
    /// if writing content sits under a choice section or the reverse, and
    /// `SessionError::MissingSection` if an active section has no content.
    pub fn new(
        config: SessionConfig,
        bank: Arc<QuestionBank>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if bank.exam() != config.exam {
            return Err(SessionError::BankMismatch {
                bank: bank.exam(),
                session: config.exam,
            });
        }
        if let Some(foreign) = bank.sections().find(|s| !config.exam.has_section(*s)) {
            return Err(SessionError::ForeignSection(foreign));
        }
        if let Some(mismatched) = bank.sections().find(|s| {
            let free_text = matches!(bank.content(*s), Some(SectionContent::Writing(_)));
            free_text != s.is_free_text()
        }) {
            return Err(SessionError::ContentMismatch(mismatched));
        }

        let sections = match &config.mode {
            ExamMode::Practice { section, .. } => {
                if !config.exam.has_section(*section) {
                    return Err(SessionError::UnknownSection(*section));
                }
                vec![*section]
            }
            ExamMode::Mock => config.exam.sections().to_vec(),
        };
        if let Some(missing) = sections.iter().find(|s| bank.content(**s).is_none()) {
            return Err(SessionError::MissingSection(*missing));
        }
        let Some(&first) = sections.first() else {
            return Err(SessionError::EmptyExam);
        };

        Ok(Self {
            answers: ExamAnswers::empty(config.exam),
            remaining_secs: config.time_limit_secs,
            config,
            bank,
            sections,
            current_section: first,
            position: 0,
            started_at,
            completed_at: None,
            time_spent_secs: None,
            report: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn exam(&self) -> ExamKind {
        self.config.exam
    }

    #[must_use]
    pub fn mode(&self) -> &ExamMode {
        &self.config.mode
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Sections active in this session, in exam order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn current_section(&self) -> Section {
        self.current_section
    }

    /// Zero-based pointer within the current section.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn current_content(&self) -> Option<&SectionContent> {
        self.bank.content(self.current_section)
    }

    fn current_len(&self) -> usize {
        self.current_content().map_or(0, SectionContent::len)
    }

    #[must_use]
    pub fn answers(&self) -> &ExamAnswers {
        &self.answers
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining_secs
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn time_spent_secs(&self) -> Option<u64> {
        self.time_spent_secs
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.report.is_some() {
            SessionPhase::Results
        } else {
            SessionPhase::Answering
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.report.is_some()
    }

    #[must_use]
    pub fn report(&self) -> Option<&ScoreReport> {
        self.report.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self
            .sections
            .iter()
            .filter_map(|s| self.bank.content(*s))
            .map(SectionContent::len)
            .sum();
        SessionProgress {
            section: self.current_section,
            position: self.position,
            section_len: self.current_len(),
            answered: self.answers.answered(),
            total,
            remaining_secs: self.remaining_secs,
            is_complete: self.is_complete(),
        }
    }

    fn ensure_answering(&self) -> Result<(), SessionError> {
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        Ok(())
    }

    fn ensure_active(&self, section: Section) -> Result<(), SessionError> {
        if self.sections.contains(&section) {
            Ok(())
        } else {
            Err(SessionError::UnknownSection(section))
        }
    }

    /// Switch to `section` and reset the pointer to its first item.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after submission and
    /// `SessionError::UnknownSection` for sections outside this session.
    pub fn select_section(&mut self, section: Section) -> Result<(), SessionError> {
        self.ensure_answering()?;
        self.ensure_active(section)?;
        self.current_section = section;
        self.position = 0;
        Ok(())
    }

    /// Insert or overwrite the chosen label for a question.
    ///
    /// The label is not checked against the question's choices.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after submission and
    /// `SessionError::UnknownSection` if `section` is inactive or is a writing section.
    pub fn record_answer(
        &mut self,
        section: Section,
        index: usize,
        label: char,
    ) -> Result<(), SessionError> {
        self.ensure_answering()?;
        self.ensure_active(section)?;
        self.answers
            .choices_mut(section)
            .ok_or(SessionError::UnknownSection(section))?
            .record(index, label);
        Ok(())
    }

    /// Answer the question under the pointer.
    ///
    /// # Errors
    ///
    /// Same as [`ExamSession::record_answer`].
    pub fn answer_current(&mut self, label: char) -> Result<(), SessionError> {
        self.record_answer(self.current_section, self.position, label)
    }

    /// Insert or overwrite the response text for a writing task.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` after submission and
    /// `SessionError::UnknownSection` if the session has no writing section.
    pub fn record_writing(
        &mut self,
        task_index: usize,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.ensure_answering()?;
        self.ensure_active(Section::Writing)?;
        self.answers
            .writing_mut()
            .ok_or(SessionError::UnknownSection(Section::Writing))?
            .record(task_index, text);
        Ok(())
    }

    /// Move to the next item; no-op on the last one.
    pub fn advance(&mut self) {
        if self.position + 1 < self.current_len() {
            self.position += 1;
        }
    }

    /// Move to the previous item; no-op on the first one.
    pub fn retreat(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    /// Count down one second, submitting when the limit is reached.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.is_complete() {
            return TickOutcome::Finished;
        }
        let Some(remaining) = self.remaining_secs else {
            return TickOutcome::Untimed;
        };

        let remaining = remaining.saturating_sub(1);
        self.remaining_secs = Some(remaining);
        if remaining == 0 {
            self.submit(now);
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining_secs: remaining,
            }
        }
    }

    /// Enter the results state, scoring the current answers.
    ///
    /// Idempotent: later calls return the report computed the first time.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Submission<'_> {
        let fresh = self.report.is_none();
        if fresh {
            self.completed_at = Some(now);
            self.time_spent_secs = Some(elapsed_secs(self.started_at, now));
        }
        let report = self
            .report
            .get_or_insert_with(|| scoring::score(&self.bank, &self.answers, &self.sections));

        if fresh {
            Submission::Fresh(report)
        } else {
            Submission::AlreadySubmitted(report)
        }
    }

    /// Clear all answers and timing and return to the answering state.
    pub fn retake(&mut self, now: DateTime<Utc>) {
        self.answers.clear();
        self.current_section = self
            .sections
            .first()
            .copied()
            .unwrap_or(self.current_section);
        self.position = 0;
        self.remaining_secs = self.config.time_limit_secs;
        self.started_at = now;
        self.completed_at = None;
        self.time_spent_secs = None;
        self.report = None;
    }

    /// History record for a completed practice session.
    ///
    /// Returns `None` for mock sessions or before submission.
    #[must_use]
    pub fn practice_entry(&self, id: Uuid) -> Option<HistoryEntry> {
        let ExamMode::Practice { topic_id, section } = &self.config.mode else {
            return None;
        };
        let report = self.report.as_ref()?;
        let score = report.section(*section)?;
        let completed_at = self.completed_at?;

        let content = self.bank.content(*section);
        let entry = HistoryEntry::new(
            id,
            topic_id.clone(),
            *section,
            score.correct,
            score.total,
            completed_at,
            self.time_spent_secs.unwrap_or(0),
            self.answers.choices(*section).cloned().unwrap_or_default(),
            content.map(|c| c.questions().to_vec()).unwrap_or_default(),
        );

        Some(match self.answers.writing().filter(|_| section.is_free_text()) {
            Some(responses) => entry.with_writing(WritingSnapshot {
                responses: responses.clone(),
                tasks: content.map(|c| c.tasks().to_vec()).unwrap_or_default(),
            }),
            None => entry,
        })
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("exam", &self.config.exam)
            .field("mode", &self.config.mode)
            .field("current_section", &self.current_section)
            .field("position", &self.position)
            .field("answered", &self.answers.answered())
            .field("remaining_secs", &self.remaining_secs)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Choice, Question, WritingTask};
    use crate::scoring::{Band, ScoreValue};
    use crate::time::fixed_now;
    use chrono::Duration;

    fn questions(n: usize) -> SectionContent {
        SectionContent::Choice(
            (0..n)
                .map(|i| {
                    Question::new(
                        format!("q{i}"),
                        vec![Choice::new('A', "a"), Choice::new('B', "b")],
                        'A',
                    )
                })
                .collect(),
        )
    }

    fn toefl_bank() -> Arc<QuestionBank> {
        Arc::new(
            QuestionBank::new(ExamKind::ToeflItp)
                .with_section(Section::Listening, questions(3))
                .with_section(Section::Structure, questions(4))
                .with_section(Section::Reading, questions(2)),
        )
    }

    fn mock_session(limit: Option<u32>) -> ExamSession {
        let config = SessionConfig {
            exam: ExamKind::ToeflItp,
            mode: ExamMode::Mock,
            time_limit_secs: limit,
        };
        ExamSession::new(config, toefl_bank(), fixed_now()).unwrap()
    }

    #[test]
    fn starts_answering_on_first_section() {
        let session = mock_session(None);
        assert_eq!(session.phase(), SessionPhase::Answering);
        assert_eq!(session.current_section(), Section::Listening);
        assert_eq!(session.position(), 0);
        assert_eq!(session.progress().total, 9);
    }

    #[test]
    fn navigation_is_clamped_at_both_edges() {
        let mut session = mock_session(None);
        session.retreat();
        assert_eq!(session.position(), 0);

        for _ in 0..10 {
            session.advance();
        }
        assert_eq!(session.position(), 2);

        session.select_section(Section::Reading).unwrap();
        assert_eq!(session.position(), 0);
        session.advance();
        session.advance();
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn rejects_sections_outside_the_exam() {
        let mut session = mock_session(None);
        assert_eq!(
            session.select_section(Section::Writing),
            Err(SessionError::UnknownSection(Section::Writing))
        );
        assert_eq!(
            session.record_writing(0, "text"),
            Err(SessionError::UnknownSection(Section::Writing))
        );
    }

    #[test]
    fn answers_insert_and_overwrite() {
        let mut session = mock_session(None);
        session.record_answer(Section::Structure, 1, 'B').unwrap();
        session.record_answer(Section::Structure, 1, 'A').unwrap();
        session.answer_current('A').unwrap();

        let structure = session.answers().choices(Section::Structure).unwrap();
        assert_eq!(structure.get(1), Some('A'));
        assert_eq!(session.answers().answered(), 2);
    }

    #[test]
    fn submit_is_idempotent_and_locks_answers() {
        let mut session = mock_session(None);
        session.record_answer(Section::Structure, 0, 'A').unwrap();

        let later = fixed_now() + Duration::seconds(95);
        let first = session.submit(later).report().clone();
        assert!(session.is_complete());
        assert_eq!(session.time_spent_secs(), Some(95));

        let again = session.submit(later + Duration::seconds(30));
        assert!(!again.is_fresh());
        assert_eq!(again.report(), &first);
        assert_eq!(session.completed_at(), Some(later));

        assert_eq!(
            session.record_answer(Section::Structure, 1, 'A'),
            Err(SessionError::Completed)
        );
        assert_eq!(
            session.select_section(Section::Reading),
            Err(SessionError::Completed)
        );
    }

    #[test]
    fn tick_counts_down_and_auto_submits() {
        let mut session = mock_session(Some(3));
        assert_eq!(
            session.tick(fixed_now()),
            TickOutcome::Running { remaining_secs: 2 }
        );
        assert_eq!(
            session.tick(fixed_now()),
            TickOutcome::Running { remaining_secs: 1 }
        );
        assert_eq!(session.tick(fixed_now()), TickOutcome::Expired);
        assert_eq!(session.phase(), SessionPhase::Results);
        assert_eq!(session.tick(fixed_now()), TickOutcome::Finished);
        assert_eq!(session.remaining_secs(), Some(0));
    }

    #[test]
    fn untimed_sessions_ignore_ticks() {
        let mut session = mock_session(None);
        assert_eq!(session.tick(fixed_now()), TickOutcome::Untimed);
        assert!(!session.is_complete());
    }

    #[test]
    fn retake_resets_everything() {
        let mut session = mock_session(Some(10));
        session.select_section(Section::Reading).unwrap();
        session.advance();
        session.answer_current('A').unwrap();
        session.tick(fixed_now());
        session.submit(fixed_now());

        let restart = fixed_now() + Duration::minutes(5);
        session.retake(restart);

        assert_eq!(session.phase(), SessionPhase::Answering);
        assert_eq!(session.current_section(), Section::Listening);
        assert_eq!(session.position(), 0);
        assert_eq!(session.answers().answered(), 0);
        assert_eq!(session.remaining_secs(), Some(10));
        assert_eq!(session.started_at(), restart);
        assert!(session.report().is_none());
    }

    #[test]
    fn practice_limits_to_one_section_and_builds_history() {
        let bank = Arc::new(
            QuestionBank::new(ExamKind::Ielts).with_section(Section::Listening, questions(4)),
        );
        let config = SessionConfig::practice(ExamKind::Ielts, TopicId::new("cam-15-1"), Section::Listening);
        let mut session = ExamSession::new(config, bank, fixed_now()).unwrap();

        assert_eq!(session.sections(), &[Section::Listening]);
        assert!(session.practice_entry(Uuid::nil()).is_none());

        session.record_answer(Section::Listening, 0, 'A').unwrap();
        session.record_answer(Section::Listening, 1, 'A').unwrap();
        session.record_answer(Section::Listening, 2, 'A').unwrap();
        let report = session.submit(fixed_now() + Duration::seconds(40)).report();
        // 3/4 * 9 = 6.75 -> 7
        assert_eq!(report.overall(), ScoreValue::Band(Band::from_whole(7)));

        let entry = session.practice_entry(Uuid::nil()).unwrap();
        assert_eq!((entry.score, entry.total, entry.percentage), (3, 4, 75));
        assert_eq!(entry.time_spent_secs, 40);
        assert_eq!(entry.questions.len(), 4);
        assert_eq!(entry.answers.len(), 3);
        assert!(entry.writing.is_none());
    }

    #[test]
    fn writing_practice_with_no_words_scores_floor() {
        let bank = Arc::new(QuestionBank::new(ExamKind::Ielts).with_section(
            Section::Writing,
            SectionContent::Writing(vec![WritingTask::task_two("Essay")]),
        ));
        let config = SessionConfig::practice(ExamKind::Ielts, TopicId::new("w1"), Section::Writing);
        let mut session = ExamSession::new(config, bank, fixed_now()).unwrap();
        session.record_writing(0, "").unwrap();

        let report = session.submit(fixed_now()).report();
        assert_eq!(report.overall(), ScoreValue::Band(Band::MIN));
        assert_eq!(report.section(Section::Writing).unwrap().total, 250);
    }

    #[test]
    fn writing_practice_entry_keeps_essays_and_prompts() {
        let bank = Arc::new(QuestionBank::new(ExamKind::Ielts).with_section(
            Section::Writing,
            SectionContent::Writing(vec![
                WritingTask::task_one("Describe the chart"),
                WritingTask::task_two("Discuss both views"),
            ]),
        ));
        let config = SessionConfig::practice(ExamKind::Ielts, TopicId::new("w2"), Section::Writing);
        let mut session = ExamSession::new(config, bank, fixed_now()).unwrap();
        session.record_writing(0, "my essay text here").unwrap();
        session.submit(fixed_now());

        let entry = session.practice_entry(Uuid::nil()).unwrap();
        let writing = entry.writing.expect("writing snapshot");
        assert_eq!(writing.responses.get(0), Some("my essay text here"));
        assert_eq!(writing.tasks.len(), 2);
        assert_eq!(writing.tasks[1].prompt(), "Discuss both views");
        assert_eq!(entry.total, 400);
    }

    #[test]
    fn construction_validates_bank() {
        let config = SessionConfig {
            exam: ExamKind::Ielts,
            mode: ExamMode::Mock,
            time_limit_secs: None,
        };
        let err = ExamSession::new(config.clone(), toefl_bank(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::BankMismatch { .. }));

        let partial = Arc::new(
            QuestionBank::new(ExamKind::Ielts).with_section(Section::Listening, questions(1)),
        );
        let err = ExamSession::new(config, partial, fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::MissingSection(Section::Reading));

        let foreign = Arc::new(
            QuestionBank::new(ExamKind::Ielts).with_section(Section::Structure, questions(1)),
        );
        let practice = SessionConfig::practice(ExamKind::Ielts, TopicId::new("t"), Section::Reading);
        let err = ExamSession::new(practice, foreign, fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::ForeignSection(Section::Structure));
    }

    #[test]
    fn construction_rejects_content_of_the_wrong_shape() {
        let choice_as_writing = Arc::new(
            QuestionBank::new(ExamKind::Ielts).with_section(Section::Writing, questions(2)),
        );
        let practice = SessionConfig::practice(ExamKind::Ielts, TopicId::new("w"), Section::Writing);
        let err = ExamSession::new(practice, choice_as_writing, fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::ContentMismatch(Section::Writing));

        let writing_as_reading = Arc::new(QuestionBank::new(ExamKind::Ielts).with_section(
            Section::Reading,
            SectionContent::Writing(vec![WritingTask::task_two("Essay")]),
        ));
        let practice = SessionConfig::practice(ExamKind::Ielts, TopicId::new("r"), Section::Reading);
        let err = ExamSession::new(practice, writing_as_reading, fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::ContentMismatch(Section::Reading));
    }
}
