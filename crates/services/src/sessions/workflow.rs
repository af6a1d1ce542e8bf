use std::sync::Arc;

use uuid::Uuid;

use exam_core::model::{ExamKind, ExamSettings, QuestionBank, Section, TopicId};
use exam_core::scoring::ScoreReport;
use exam_core::session::{ExamSession, SessionConfig, TickOutcome};
use storage::history::HistoryRepository;

use super::persist::{PersistHandle, PersistStatus};
use crate::Clock;
use crate::error::WorkflowError;
use crate::result_sink::{ResultRecord, ResultSink};

/// Result of submitting a session through the service.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub report: ScoreReport,
    /// `false` when the session had already been submitted.
    pub fresh: bool,
    pub persistence: PersistHandle,
}

/// Result of one countdown tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub outcome: TickOutcome,
    /// Present only when this tick expired the session.
    pub persistence: Option<PersistHandle>,
}

/// Drives exam sessions and persists completed attempts.
///
/// Practice attempts go to the local history list, mock attempts to the
/// result sink. Both writes run on background tasks so results show
/// without waiting on storage.
#[derive(Clone)]
pub struct ExamSessionService {
    clock: Clock,
    settings: ExamSettings,
    history: HistoryRepository,
    sink: Arc<dyn ResultSink>,
}

impl ExamSessionService {
    #[must_use]
    pub fn new(clock: Clock, history: HistoryRepository, sink: Arc<dyn ResultSink>) -> Self {
        Self {
            clock,
            settings: ExamSettings::default(),
            history,
            sink,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ExamSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &ExamSettings {
        &self.settings
    }

    /// Start a session from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Session` when the bank cannot serve the configuration.
    pub fn start(
        &self,
        config: SessionConfig,
        bank: Arc<QuestionBank>,
    ) -> Result<ExamSession, WorkflowError> {
        let session = ExamSession::new(config, bank, self.clock.now())?;
        tracing::debug!(
            exam = %session.exam(),
            mode = session.mode().as_str(),
            sections = session.sections().len(),
            "exam session started"
        );
        Ok(session)
    }

    /// Start a timed full mock exam.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Session` when the bank lacks a section.
    pub fn start_mock(
        &self,
        exam: ExamKind,
        bank: Arc<QuestionBank>,
    ) -> Result<ExamSession, WorkflowError> {
        self.start(SessionConfig::mock(exam, &self.settings), bank)
    }

    /// Start a single-section practice run, timed when `timed` is set.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Session` when the section is foreign or missing.
    pub fn start_practice(
        &self,
        exam: ExamKind,
        topic_id: TopicId,
        section: Section,
        bank: Arc<QuestionBank>,
        timed: bool,
    ) -> Result<ExamSession, WorkflowError> {
        let limit = if timed {
            self.settings.section_time_limit_secs(exam, section)
        } else {
            None
        };
        let config = SessionConfig::practice(exam, topic_id, section).with_time_limit(limit);
        self.start(config, bank)
    }

    /// Submit the session and persist the attempt once.
    ///
    /// Persistence runs on a detached task, so dropping the caller (or
    /// aborting a countdown) never loses the write. Repeated calls return the
    /// original report with a `Skipped` handle.
    pub fn submit(&self, session: &mut ExamSession) -> SubmitOutcome {
        let submission = session.submit(self.clock.now());
        let fresh = submission.is_fresh();
        let report = submission.report().clone();

        let persistence = if fresh {
            self.persist(session)
        } else {
            PersistHandle::settled(PersistStatus::Skipped)
        };

        SubmitOutcome {
            report,
            fresh,
            persistence,
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&self, session: &mut ExamSession) -> TickReport {
        let outcome = session.tick(self.clock.now());
        let persistence = if outcome == TickOutcome::Expired {
            tracing::info!(exam = %session.exam(), "time limit reached, session submitted");
            Some(self.persist(session))
        } else {
            None
        };
        TickReport {
            outcome,
            persistence,
        }
    }

    /// Clear answers and restart timing for another attempt.
    pub fn retake(&self, session: &mut ExamSession) {
        session.retake(self.clock.now());
    }

    /// Upload a completed mock session again, e.g. after a failed attempt.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotSubmitted` before submission and
    /// `WorkflowError::NotUploadable` for practice sessions.
    pub fn retry_upload(&self, session: &ExamSession) -> Result<PersistHandle, WorkflowError> {
        if session.mode().is_practice() {
            return Err(WorkflowError::NotUploadable);
        }
        let record = ResultRecord::from_session(session).ok_or(WorkflowError::NotSubmitted)?;
        Ok(self.spawn_upload(record))
    }

    fn persist(&self, session: &ExamSession) -> PersistHandle {
        if session.mode().is_practice() {
            return self.spawn_history_write(session);
        }
        match ResultRecord::from_session(session) {
            Some(record) => self.spawn_upload(record),
            None => PersistHandle::settled(PersistStatus::Skipped),
        }
    }

    fn spawn_history_write(&self, session: &ExamSession) -> PersistHandle {
        let Some(entry) = session.practice_entry(Uuid::new_v4()) else {
            return PersistHandle::settled(PersistStatus::Skipped);
        };
        let exam = session.exam();

        let (tx, handle) = PersistHandle::pending();
        let history = self.history.clone();
        tokio::spawn(async move {
            let (topic, section, percentage) =
                (entry.topic_id.clone(), entry.section, entry.percentage);
            let status = match history.record_attempt(exam, entry).await {
                Ok(()) => {
                    tracing::info!(topic = %topic, section = %section, percentage, "practice attempt recorded");
                    PersistStatus::Saved
                }
                Err(err) => {
                    tracing::warn!(error = %err, topic = %topic, "failed to record practice attempt");
                    PersistStatus::Failed(err.to_string())
                }
            };
            tx.send_replace(status);
        });
        handle
    }

    fn spawn_upload(&self, record: ResultRecord) -> PersistHandle {
        if !self.sink.enabled() {
            return PersistHandle::settled(PersistStatus::Skipped);
        }

        let (tx, handle) = PersistHandle::pending();
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let status = match sink.upload(&record).await {
                Ok(()) => {
                    tracing::info!(exam = %record.exam_type, score = record.total_score, "exam result uploaded");
                    PersistStatus::Saved
                }
                Err(err) => {
                    tracing::warn!(error = %err, exam = %record.exam_type, "exam result upload failed");
                    PersistStatus::Failed(err.to_string())
                }
            };
            tx.send_replace(status);
        });
        handle
    }
}
