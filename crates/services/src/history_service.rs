use std::collections::BTreeMap;

use exam_core::model::{ExamKind, HistoryEntry, Section};
use exam_core::scoring::round_ratio_half_up;
use storage::history::{HistoryRepository, MigrationReport};

use crate::error::HistoryServiceError;

/// Aggregates for one section of the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionStats {
    pub section: Section,
    pub attempts: usize,
    pub average_percentage: u8,
    pub best_percentage: u8,
}

/// Aggregates over the stored practice history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub attempts: usize,
    pub average_percentage: u8,
    pub best_percentage: u8,
    pub total_time_secs: u64,
    pub per_section: Vec<SectionStats>,
}

impl HistoryStats {
    #[must_use]
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut grouped: BTreeMap<Section, Vec<u8>> = BTreeMap::new();
        for entry in entries {
            grouped.entry(entry.section).or_default().push(entry.percentage);
        }

        let percentages: Vec<u8> = entries.iter().map(|e| e.percentage).collect();
        Self {
            attempts: entries.len(),
            average_percentage: mean(&percentages),
            best_percentage: percentages.iter().copied().max().unwrap_or(0),
            total_time_secs: entries.iter().map(|e| e.time_spent_secs).sum(),
            per_section: grouped
                .into_iter()
                .map(|(section, values)| SectionStats {
                    section,
                    attempts: values.len(),
                    average_percentage: mean(&values),
                    best_percentage: values.iter().copied().max().unwrap_or(0),
                })
                .collect(),
        }
    }
}

fn mean(values: &[u8]) -> u8 {
    let sum: u64 = values.iter().map(|v| u64::from(*v)).sum();
    u8::try_from(round_ratio_half_up(sum, values.len() as u64)).unwrap_or(100)
}

/// Read side of the practice history, plus the legacy migration.
#[derive(Clone)]
pub struct HistoryService {
    history: HistoryRepository,
}

impl HistoryService {
    #[must_use]
    pub fn new(history: HistoryRepository) -> Self {
        Self { history }
    }

    /// Convert legacy progress once; safe to call on every load.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` if the store fails.
    pub async fn migrate(&self, exam: ExamKind) -> Result<MigrationReport, HistoryServiceError> {
        Ok(self.history.migrate_old_format(exam).await?)
    }

    /// Full history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` if the list cannot be read.
    pub async fn load(&self, exam: ExamKind) -> Result<Vec<HistoryEntry>, HistoryServiceError> {
        Ok(self.history.load_history(exam).await?)
    }

    /// At most `limit` of the most recent entries.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` if the list cannot be read.
    pub async fn recent(
        &self,
        exam: ExamKind,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, HistoryServiceError> {
        let mut entries = self.load(exam).await?;
        entries.truncate(limit);
        Ok(entries)
    }

    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` if the list cannot be read.
    pub async fn stats(&self, exam: ExamKind) -> Result<HistoryStats, HistoryServiceError> {
        let entries = self.load(exam).await?;
        Ok(HistoryStats::from_entries(&entries))
    }
}
