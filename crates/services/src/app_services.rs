use std::sync::Arc;

use exam_core::model::{ExamKind, ExamSettings};
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::history_service::HistoryService;
use crate::result_sink::{HttpResultSink, NoopResultSink, ResultSink, ResultStoreConfig};
use crate::sessions::ExamSessionService;

/// Assembles app-facing services and runs the load-time history migration.
#[derive(Clone)]
pub struct ExamServices {
    sessions: Arc<ExamSessionService>,
    history: Arc<HistoryService>,
}

impl ExamServices {
    /// Build services backed by `SQLite` storage, with the result store read
    /// from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization, migration or
    /// result store configuration fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let sink: Arc<dyn ResultSink> = match ResultStoreConfig::from_env()? {
            Some(settings) => Arc::new(HttpResultSink::new(settings)),
            None => {
                tracing::info!("EXAM_RESULTS_URL not set, mock results stay local");
                Arc::new(NoopResultSink)
            }
        };
        Self::with_storage(storage, clock, sink, ExamSettings::default()).await
    }

    /// Build services over any storage backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Storage` if the legacy migration fails.
    pub async fn with_storage(
        storage: Storage,
        clock: Clock,
        sink: Arc<dyn ResultSink>,
        settings: ExamSettings,
    ) -> Result<Self, AppServicesError> {
        let repo = storage.history().with_cap(settings.history_cap());
        for exam in ExamKind::ALL {
            repo.migrate_old_format(exam).await?;
        }

        let sessions = Arc::new(
            ExamSessionService::new(clock, repo.clone(), sink).with_settings(settings),
        );
        let history = Arc::new(HistoryService::new(repo));

        Ok(Self { sessions, history })
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<ExamSessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }
}
