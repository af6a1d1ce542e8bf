use std::sync::Arc;

use chrono::Duration;
use exam_core::model::{AnswerMap, ExamKind, HistoryEntry, Section, TopicId};
use exam_core::time::fixed_now;
use storage::history::HistoryRepository;
use storage::repository::{KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;
use uuid::Uuid;

#[tokio::test]
async fn sqlite_key_value_round_trip() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    // Migrations are re-runnable.
    repo.migrate().await.expect("migrate twice");

    assert_eq!(repo.get("missing").await.unwrap(), None);

    repo.set("ielts_practice_history", "[]").await.unwrap();
    repo.set("ielts_practice_history", "[1]").await.unwrap();
    assert_eq!(
        repo.get("ielts_practice_history").await.unwrap().as_deref(),
        Some("[1]")
    );

    repo.remove("ielts_practice_history").await.unwrap();
    assert!(!repo.contains("ielts_practice_history").await.unwrap());
}

#[tokio::test]
async fn sqlite_backs_history_and_migration() {
    let storage = Storage::sqlite("sqlite:file:memdb_history?mode=memory&cache=shared")
        .await
        .expect("storage");
    let history = storage.history();

    let legacy = serde_json::json!({
        "set-a": { "completed": true, "score": 28, "total": 40,
                   "completedAt": (fixed_now() - Duration::hours(3)).to_rfc3339() }
    });
    storage
        .kv
        .set("toefl_listening_progress", &legacy.to_string())
        .await
        .unwrap();

    let report = history.migrate_old_format(ExamKind::ToeflItp).await.unwrap();
    assert_eq!(report.migrated, 1);

    let entry = HistoryEntry::new(
        Uuid::new_v4(),
        TopicId::new("set-b"),
        Section::Structure,
        20,
        40,
        fixed_now(),
        600,
        AnswerMap::new(),
        Vec::new(),
    );
    history
        .record_attempt(ExamKind::ToeflItp, entry)
        .await
        .unwrap();

    let loaded = history.load_history(ExamKind::ToeflItp).await.unwrap();
    let topics: Vec<_> = loaded.iter().map(|e| e.topic_id.as_str()).collect();
    assert_eq!(topics, vec!["set-b", "set-a"]);
    assert_eq!(loaded[1].percentage, 70);
}

#[tokio::test]
async fn history_cap_applies_on_sqlite() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_cap?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    let history = HistoryRepository::new(Arc::new(repo)).with_cap(3);

    for i in 0..5 {
        let entry = HistoryEntry::new(
            Uuid::new_v4(),
            TopicId::new(format!("t{i}")),
            Section::Listening,
            1,
            1,
            fixed_now(),
            1,
            AnswerMap::new(),
            Vec::new(),
        );
        history.record_attempt(ExamKind::Ielts, entry).await.unwrap();
    }

    let loaded = history.load_history(ExamKind::Ielts).await.unwrap();
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded[0].topic_id.as_str(), "t4");
}
