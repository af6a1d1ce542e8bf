#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod history_service;
pub mod result_sink;
pub mod sessions;

pub use exam_core::Clock;

pub use app_services::ExamServices;
pub use error::{HistoryServiceError, SinkError, WorkflowError};
pub use history_service::{HistoryService, HistoryStats, SectionStats};
pub use result_sink::{HttpResultSink, NoopResultSink, ResultRecord, ResultSink, ResultStoreConfig};
pub use sessions::{
    Countdown, CountdownEnd, CountdownHandle, ExamSessionService, IntervalTicker, PersistHandle,
    PersistStatus, SubmitOutcome, TickReport, Ticker,
};
