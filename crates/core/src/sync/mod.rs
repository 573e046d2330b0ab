//! Appointment-to-calendar synchronization
//!
//! The orchestrator decides and executes create/update/delete against the
//! calendar provider for a single appointment; the batch coordinator drives
//! it over many appointments with partial-failure isolation.

pub mod batch;
pub mod event;
pub mod orchestrator;
pub mod ports;

pub use batch::BatchCoordinator;
pub use orchestrator::SyncOrchestrator;
pub use ports::{CalendarApi, SyncRecordRepository};
