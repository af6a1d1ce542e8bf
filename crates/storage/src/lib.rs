#![forbid(unsafe_code)]

pub mod history;
pub mod repository;
pub mod sqlite;

pub use history::{HistoryRepository, LegacyTopicProgress, MigrationReport};
pub use repository::{InMemoryKeyValueStore, KeyValueStore, Storage, StorageError};
