//! SQLite persistence
//!
//! Pooled connection manager plus repository implementations of the core
//! persistence ports.

mod credential_repository;
mod manager;
mod sync_record_repository;

pub use credential_repository::SqliteCredentialStore;
pub use manager::DbManager;
pub use sync_record_repository::SqliteSyncRecordRepository;
