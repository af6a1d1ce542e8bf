use thiserror::Error;
use url::Url;

use crate::model::{ExamKind, Section};

/// Maximum number of practice attempts kept per exam kind.
pub const HISTORY_CAP: usize = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("invalid base URL")]
    InvalidBaseUrl,
    #[error("result store API key cannot be empty")]
    EmptyApiKey,
}

//
// ─── EXAM SETTINGS ─────────────────────────────────────────────────────────────
//

/// Timing and retention knobs for exam sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSettings {
    history_cap: usize,
    ielts_minutes: [(Section, u32); 3],
    toefl_minutes: [(Section, u32); 3],
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            history_cap: HISTORY_CAP,
            ielts_minutes: [
                (Section::Listening, 30),
                (Section::Reading, 60),
                (Section::Writing, 60),
            ],
            toefl_minutes: [
                (Section::Listening, 35),
                (Section::Structure, 25),
                (Section::Reading, 55),
            ],
        }
    }
}

impl ExamSettings {
    #[must_use]
    pub fn history_cap(&self) -> usize {
        self.history_cap
    }

    #[must_use]
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap.max(1);
        self
    }

    /// Official duration of a section in minutes.
    #[must_use]
    pub fn section_minutes(&self, exam: ExamKind, section: Section) -> Option<u32> {
        let table = match exam {
            ExamKind::Ielts => &self.ielts_minutes,
            ExamKind::ToeflItp => &self.toefl_minutes,
        };
        table
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, minutes)| *minutes)
    }

    /// Countdown for a full mock exam: the sum of all section durations.
    #[must_use]
    pub fn mock_time_limit_secs(&self, exam: ExamKind) -> u32 {
        exam.sections()
            .iter()
            .filter_map(|s| self.section_minutes(exam, *s))
            .sum::<u32>()
            * 60
    }

    /// Countdown for a timed practice run of one section.
    #[must_use]
    pub fn section_time_limit_secs(&self, exam: ExamKind, section: Section) -> Option<u32> {
        self.section_minutes(exam, section).map(|m| m * 60)
    }
}

//
// ─── RESULT STORE SETTINGS ─────────────────────────────────────────────────────
//

/// Connection settings for the remote result store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultStoreSettings {
    base_url: Url,
    api_key: String,
}

#[derive(Clone, Debug, Default)]
pub struct ResultStoreSettingsDraft {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

impl ResultStoreSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and normalize the draft.
    ///
    /// Returns `Ok(None)` when no base URL is configured, which disables
    /// remote persistence.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the URL does not parse or the key is blank.
    pub fn validate(self) -> Result<Option<ResultStoreSettings>, SettingsError> {
        let Some(base_url) = normalize_optional(self.base_url) else {
            return Ok(None);
        };
        let base_url = Url::parse(&base_url).map_err(|_| SettingsError::InvalidBaseUrl)?;
        if base_url.cannot_be_a_base() {
            return Err(SettingsError::InvalidBaseUrl);
        }
        let api_key = normalize_optional(self.api_key).ok_or(SettingsError::EmptyApiKey)?;

        Ok(Some(ResultStoreSettings { base_url, api_key }))
    }
}

impl ResultStoreSettings {
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}
