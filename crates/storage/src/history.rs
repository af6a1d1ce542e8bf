//! Practice history over a [`KeyValueStore`].
//!
//! Each exam kind keeps one JSON list under `{exam}_practice_history`, most
//! recent attempt first and capped at [`HISTORY_CAP`] entries. Older builds
//! stored progress per section under `{exam}_{section}_progress` as a map of
//! topic id to [`LegacyTopicProgress`]; [`HistoryRepository::migrate_old_format`]
//! folds those into the list once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use exam_core::model::{AnswerMap, ExamKind, HISTORY_CAP, HistoryEntry, Question, TopicId};

use crate::repository::{KeyValueStore, StorageError};

#[must_use]
pub fn history_key(exam: ExamKind) -> String {
    format!("{}_practice_history", exam.as_str())
}

#[must_use]
pub fn legacy_keys(exam: ExamKind) -> Vec<String> {
    exam.sections()
        .iter()
        .map(|section| format!("{}_{}_progress", exam.as_str(), section.as_str()))
        .collect()
}

/// One topic entry of the legacy per-section progress map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTopicProgress {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub answers: AnswerMap,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Legacy value stored under one `{exam}_{section}_progress` key.
pub type LegacyProgress = BTreeMap<String, LegacyTopicProgress>;

/// Outcome of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// The new-format list already existed; nothing was touched.
    pub already_migrated: bool,
    pub migrated: usize,
    /// Legacy keys that failed to parse and were left in place.
    pub skipped_keys: Vec<String>,
}

/// Read-modify-write access to the practice history list.
#[derive(Clone)]
pub struct HistoryRepository {
    kv: Arc<dyn KeyValueStore>,
    cap: usize,
}

impl HistoryRepository {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            cap: HISTORY_CAP,
        }
    }

    #[must_use]
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap.max(1);
        self
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Stored list, most recent first, or empty when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored list is corrupt.
    pub async fn load_history(&self, exam: ExamKind) -> Result<Vec<HistoryEntry>, StorageError> {
        match self.kv.get(&history_key(exam)).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(ser),
            None => Ok(Vec::new()),
        }
    }

    /// Prepend `entry`, keep the most recent `cap` entries and persist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be read or written.
    pub async fn record_attempt(
        &self,
        exam: ExamKind,
        entry: HistoryEntry,
    ) -> Result<(), StorageError> {
        let mut entries = self.load_history(exam).await?;
        entries.insert(0, entry);
        entries.truncate(self.cap);
        self.save(exam, &entries).await
    }

    /// One-time conversion of legacy per-section progress into the history list.
    ///
    /// Safe to call on every load: once the list exists this is a no-op. A
    /// legacy key that fails to parse is logged, skipped and kept; the rest
    /// are converted, written once and deleted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or written.
    pub async fn migrate_old_format(&self, exam: ExamKind) -> Result<MigrationReport, StorageError> {
        if self.kv.contains(&history_key(exam)).await? {
            return Ok(MigrationReport {
                already_migrated: true,
                ..MigrationReport::default()
            });
        }

        let mut report = MigrationReport::default();
        let mut converted_keys = Vec::new();
        let mut entries = Vec::new();

        for (key, section) in legacy_keys(exam).into_iter().zip(exam.sections()) {
            let Some(raw) = self.kv.get(&key).await? else {
                continue;
            };
            let progress: LegacyProgress = match serde_json::from_str(&raw) {
                Ok(progress) => progress,
                Err(err) => {
                    tracing::warn!(%exam, key = %key, error = %err, "skipping unreadable legacy progress");
                    report.skipped_keys.push(key);
                    continue;
                }
            };

            for (topic, progress) in progress {
                if !progress.completed {
                    continue;
                }
                // undated attempts sort after every dated one
                let completed_at = progress.completed_at.unwrap_or_else(|| {
                    tracing::debug!(%exam, topic = %topic, "legacy topic has no completion time");
                    DateTime::<Utc>::UNIX_EPOCH
                });
                entries.push(HistoryEntry::new(
                    Uuid::new_v4(),
                    TopicId::new(topic),
                    *section,
                    progress.score,
                    progress.total,
                    completed_at,
                    progress.time_spent,
                    progress.answers,
                    progress.questions,
                ));
            }
            converted_keys.push(key);
        }

        if converted_keys.is_empty() {
            return Ok(report);
        }

        entries.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        entries.truncate(self.cap);
        report.migrated = entries.len();
        self.save(exam, &entries).await?;

        for key in &converted_keys {
            self.kv.remove(key).await?;
        }

        tracing::info!(
            %exam,
            migrated = report.migrated,
            skipped = report.skipped_keys.len(),
            "migrated legacy practice progress"
        );
        Ok(report)
    }

    async fn save(&self, exam: ExamKind, entries: &[HistoryEntry]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(entries).map_err(ser)?;
        self.kv.set(&history_key(exam), &raw).await
    }
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryKeyValueStore;
    use chrono::Duration;
    use exam_core::model::Section;
    use exam_core::time::fixed_now;

    fn entry(topic: &str, minutes_ago: i64) -> HistoryEntry {
        HistoryEntry::new(
            Uuid::new_v4(),
            TopicId::new(topic),
            Section::Reading,
            5,
            10,
            fixed_now() - Duration::minutes(minutes_ago),
            300,
            AnswerMap::new(),
            Vec::new(),
        )
    }

    fn repo() -> (InMemoryKeyValueStore, HistoryRepository) {
        let kv = InMemoryKeyValueStore::new();
        let repo = HistoryRepository::new(Arc::new(kv.clone()));
        (kv, repo)
    }

    #[test]
    fn keys_are_scoped_by_exam_and_section() {
        assert_eq!(history_key(ExamKind::Ielts), "ielts_practice_history");
        assert_eq!(
            legacy_keys(ExamKind::ToeflItp),
            vec![
                "toefl_listening_progress",
                "toefl_structure_progress",
                "toefl_reading_progress"
            ]
        );
    }

    #[tokio::test]
    async fn load_returns_empty_without_data() {
        let (_, repo) = repo();
        assert!(repo.load_history(ExamKind::Ielts).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_prepends_most_recent() {
        let (_, repo) = repo();
        repo.record_attempt(ExamKind::Ielts, entry("a", 10)).await.unwrap();
        repo.record_attempt(ExamKind::Ielts, entry("b", 0)).await.unwrap();

        let history = repo.load_history(ExamKind::Ielts).await.unwrap();
        let topics: Vec<_> = history.iter().map(|e| e.topic_id.as_str()).collect();
        assert_eq!(topics, vec!["b", "a"]);
        assert!(repo.load_history(ExamKind::ToeflItp).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hundred_and_first_attempt_drops_oldest() {
        let (_, repo) = repo();
        for i in 0..=100 {
            repo.record_attempt(ExamKind::ToeflItp, entry(&format!("t{i}"), 0))
                .await
                .unwrap();
        }

        let history = repo.load_history(ExamKind::ToeflItp).await.unwrap();
        assert_eq!(history.len(), 100);
        assert_eq!(history[0].topic_id.as_str(), "t100");
        assert!(history.iter().all(|e| e.topic_id.as_str() != "t0"));
    }

    #[tokio::test]
    async fn corrupt_list_is_a_serialization_error() {
        let (kv, repo) = repo();
        kv.set("ielts_practice_history", "{not json").await.unwrap();
        let err = repo.load_history(ExamKind::Ielts).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn migration_converts_sorts_and_deletes_legacy_keys() {
        let (kv, repo) = repo();
        let now = fixed_now();
        let listening = serde_json::json!({
            "cam-1": { "completed": true, "score": 30, "total": 40,
                       "completedAt": (now - Duration::days(2)).to_rfc3339(), "timeSpent": 1500 },
            "cam-2": { "completed": false, "score": 3, "total": 40 }
        });
        let reading = serde_json::json!({
            "cam-3": { "completed": true, "score": 12, "total": 13,
                       "completedAt": now.to_rfc3339(), "timeSpent": 900,
                       "answers": { "0": "A", "1": "C" } }
        });
        kv.set("ielts_listening_progress", &listening.to_string()).await.unwrap();
        kv.set("ielts_reading_progress", &reading.to_string()).await.unwrap();

        let report = repo.migrate_old_format(ExamKind::Ielts).await.unwrap();
        assert_eq!(report.migrated, 2);
        assert!(report.skipped_keys.is_empty());

        let history = repo.load_history(ExamKind::Ielts).await.unwrap();
        assert_eq!(history[0].topic_id.as_str(), "cam-3");
        assert_eq!(history[0].section, Section::Reading);
        assert_eq!(history[0].percentage, 92);
        assert_eq!(history[0].answers.get(1), Some('C'));
        assert_eq!(history[1].topic_id.as_str(), "cam-1");
        assert_eq!(history[1].time_spent_secs, 1500);

        assert!(!kv.contains("ielts_listening_progress").await.unwrap());
        assert!(!kv.contains("ielts_reading_progress").await.unwrap());
    }

    #[tokio::test]
    async fn undated_completed_topic_is_migrated_last() {
        let (kv, repo) = repo();
        let reading = serde_json::json!({
            "t1": { "completed": true, "score": 9, "total": 10 },
            "t2": { "completed": true, "score": 5, "total": 10,
                    "completedAt": fixed_now().to_rfc3339() }
        });
        kv.set("ielts_reading_progress", &reading.to_string()).await.unwrap();

        let report = repo.migrate_old_format(ExamKind::Ielts).await.unwrap();
        assert_eq!(report.migrated, 2);

        let history = repo.load_history(ExamKind::Ielts).await.unwrap();
        assert_eq!(history[0].topic_id.as_str(), "t2");
        assert_eq!(history[1].topic_id.as_str(), "t1");
        assert_eq!(history[1].percentage, 90);
        assert_eq!(history[1].completed_at, DateTime::<Utc>::UNIX_EPOCH);
        assert!(!kv.contains("ielts_reading_progress").await.unwrap());
    }

    #[tokio::test]
    async fn migration_is_idempotent() {
        let (kv, repo) = repo();
        let legacy = serde_json::json!({
            "t1": { "completed": true, "score": 1, "total": 2,
                    "completedAt": fixed_now().to_rfc3339() }
        });
        kv.set("toefl_structure_progress", &legacy.to_string()).await.unwrap();

        let first = repo.migrate_old_format(ExamKind::ToeflItp).await.unwrap();
        assert_eq!(first.migrated, 1);

        // A stale legacy key reappearing must not be merged again.
        kv.set("toefl_structure_progress", &legacy.to_string()).await.unwrap();
        let second = repo.migrate_old_format(ExamKind::ToeflItp).await.unwrap();
        assert!(second.already_migrated);
        assert_eq!(repo.load_history(ExamKind::ToeflItp).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_legacy_key_is_skipped_and_kept() {
        let (kv, repo) = repo();
        kv.set("ielts_writing_progress", "][").await.unwrap();
        let reading = serde_json::json!({
            "r1": { "completed": true, "score": 9, "total": 10,
                    "completedAt": fixed_now().to_rfc3339() }
        });
        kv.set("ielts_reading_progress", &reading.to_string()).await.unwrap();

        let report = repo.migrate_old_format(ExamKind::Ielts).await.unwrap();
        assert_eq!(report.migrated, 1);
        assert_eq!(report.skipped_keys, vec!["ielts_writing_progress".to_string()]);
        assert!(kv.contains("ielts_writing_progress").await.unwrap());
        assert!(!kv.contains("ielts_reading_progress").await.unwrap());
    }

    #[tokio::test]
    async fn nothing_to_migrate_writes_nothing() {
        let (kv, repo) = repo();
        let report = repo.migrate_old_format(ExamKind::Ielts).await.unwrap();
        assert_eq!(report, MigrationReport::default());
        assert_eq!(kv.len().unwrap(), 0);
    }
}
