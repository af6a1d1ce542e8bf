use std::collections::BTreeMap;

use crate::model::Section;
use crate::scoring::{Band, ScoringPolicy, WritingFeedback};
use crate::scoring::rounding::percentage;

/// A scaled value under one of the two scoring policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreValue {
    Band(Band),
    Scaled(u16),
}

impl ScoreValue {
    #[must_use]
    pub fn value(self) -> f64 {
        match self {
            ScoreValue::Band(band) => band.value(),
            ScoreValue::Scaled(score) => f64::from(score),
        }
    }

    #[must_use]
    pub fn band(self) -> Option<Band> {
        match self {
            ScoreValue::Band(band) => Some(band),
            ScoreValue::Scaled(_) => None,
        }
    }

    #[must_use]
    pub fn scaled(self) -> Option<u16> {
        match self {
            ScoreValue::Scaled(score) => Some(score),
            ScoreValue::Band(_) => None,
        }
    }
}

/// Raw and scaled result for one section.
///
/// For writing, `correct`/`total` are credited words against the summed minimums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionScore {
    pub section: Section,
    pub correct: u32,
    pub total: u32,
    pub scaled: ScoreValue,
}

impl SectionScore {
    #[must_use]
    pub fn percentage(&self) -> u8 {
        percentage(self.correct, self.total)
    }
}

/// Result of a submitted session. Computed once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreReport {
    policy: ScoringPolicy,
    sections: Vec<SectionScore>,
    overall: ScoreValue,
    writing: Option<WritingFeedback>,
}

impl ScoreReport {
    #[must_use]
    pub(crate) fn new(
        policy: ScoringPolicy,
        sections: Vec<SectionScore>,
        overall: ScoreValue,
        writing: Option<WritingFeedback>,
    ) -> Self {
        Self {
            policy,
            sections,
            overall,
            writing,
        }
    }

    #[must_use]
    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    #[must_use]
    pub fn sections(&self) -> &[SectionScore] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, section: Section) -> Option<&SectionScore> {
        self.sections.iter().find(|s| s.section == section)
    }

    #[must_use]
    pub fn overall(&self) -> ScoreValue {
        self.overall
    }

    #[must_use]
    pub fn writing(&self) -> Option<&WritingFeedback> {
        self.writing.as_ref()
    }

    /// Section slug to scaled value, the shape the remote result store expects.
    #[must_use]
    pub fn section_scores(&self) -> BTreeMap<String, f64> {
        self.sections
            .iter()
            .map(|s| (s.section.as_str().to_string(), s.scaled.value()))
            .collect()
    }
}
