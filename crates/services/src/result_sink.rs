//! Remote storage for completed mock exams.

use std::collections::BTreeMap;
use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use exam_core::model::{
    ExamAnswers, ExamKind, ResultStoreSettings, ResultStoreSettingsDraft, SettingsError,
};
use exam_core::session::ExamSession;

use crate::error::SinkError;

const RESULTS_PATH: &str = "rest/v1/exam_results";

/// Record uploaded for a completed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub exam_type: ExamKind,
    pub exam_mode: String,
    pub total_score: f64,
    pub section_scores: BTreeMap<String, f64>,
    pub answers: ExamAnswers,
    pub time_spent_seconds: u64,
}

impl ResultRecord {
    /// Builds the record from a submitted session; `None` before submission.
    #[must_use]
    pub fn from_session(session: &ExamSession) -> Option<Self> {
        let report = session.report()?;
        Some(Self {
            exam_type: session.exam(),
            exam_mode: session.mode().as_str().to_owned(),
            total_score: report.overall().value(),
            section_scores: report.section_scores(),
            answers: session.answers().clone(),
            time_spent_seconds: session.time_spent_secs().unwrap_or(0),
        })
    }
}

/// Destination for completed exam results.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Whether uploads are attempted at all.
    fn enabled(&self) -> bool {
        true
    }

    /// # Errors
    ///
    /// Returns `SinkError` when the record could not be stored.
    async fn upload(&self, record: &ResultRecord) -> Result<(), SinkError>;
}

/// Sink used when no result store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResultSink;

#[async_trait]
impl ResultSink for NoopResultSink {
    fn enabled(&self) -> bool {
        false
    }

    async fn upload(&self, _record: &ResultRecord) -> Result<(), SinkError> {
        Err(SinkError::Disabled)
    }
}

/// Environment-driven result store configuration.
pub struct ResultStoreConfig;

impl ResultStoreConfig {
    /// Reads `EXAM_RESULTS_URL` and `EXAM_RESULTS_API_KEY`.
    ///
    /// An unset or blank URL means uploads are disabled.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` when the URL is malformed or the key is missing.
    pub fn from_env() -> Result<Option<ResultStoreSettings>, SettingsError> {
        ResultStoreSettingsDraft {
            base_url: env::var("EXAM_RESULTS_URL").ok(),
            api_key: env::var("EXAM_RESULTS_API_KEY").ok(),
        }
        .validate()
    }
}

/// Posts results to a PostgREST-style table endpoint.
#[derive(Clone)]
pub struct HttpResultSink {
    client: Client,
    settings: ResultStoreSettings,
}

impl HttpResultSink {
    #[must_use]
    pub fn new(settings: ResultStoreSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{RESULTS_PATH}",
            self.settings.base_url().as_str().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ResultSink for HttpResultSink {
    async fn upload(&self, record: &ResultRecord) -> Result<(), SinkError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("apikey", self.settings.api_key())
            .header("Prefer", "return=minimal")
            .bearer_auth(self.settings.api_key())
            .json(record)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        Choice, ExamSettings, Question, QuestionBank, Section, SectionContent,
    };
    use exam_core::session::SessionConfig;
    use exam_core::time::fixed_now;
    use std::sync::Arc;

    fn settings(url: &str) -> ResultStoreSettings {
        ResultStoreSettingsDraft {
            base_url: Some(url.into()),
            api_key: Some("anon-key".into()),
        }
        .validate()
        .unwrap()
        .unwrap()
    }

    fn one_question() -> SectionContent {
        SectionContent::Choice(vec![Question::new(
            "Q",
            vec![Choice::new('A', "a"), Choice::new('B', "b")],
            'A',
        )])
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let sink = HttpResultSink::new(settings("https://db.example.com/"));
        assert_eq!(
            sink.endpoint(),
            "https://db.example.com/rest/v1/exam_results"
        );
    }

    #[tokio::test]
    async fn noop_sink_is_disabled() {
        let sink = NoopResultSink;
        assert!(!sink.enabled());
        let record = ResultRecord {
            exam_type: ExamKind::Ielts,
            exam_mode: "mock".into(),
            total_score: 1.0,
            section_scores: BTreeMap::new(),
            answers: ExamAnswers::empty(ExamKind::Ielts),
            time_spent_seconds: 0,
        };
        assert!(matches!(sink.upload(&record).await, Err(SinkError::Disabled)));
    }

    #[test]
    fn record_requires_submission_and_serializes_camel_case() {
        let bank = Arc::new(
            QuestionBank::new(ExamKind::ToeflItp)
                .with_section(Section::Listening, one_question())
                .with_section(Section::Structure, one_question())
                .with_section(Section::Reading, one_question()),
        );
        let config = SessionConfig::mock(ExamKind::ToeflItp, &ExamSettings::default());
        let mut session = ExamSession::new(config, bank, fixed_now()).unwrap();
        assert!(ResultRecord::from_session(&session).is_none());

        session.submit(fixed_now());
        let record = ResultRecord::from_session(&session).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["examType"], "toefl_itp");
        assert_eq!(json["examMode"], "mock");
        assert!(json.get("timeSpentSeconds").is_some());
        assert_eq!(json["answers"]["examType"], json["examType"]);
    }
}
