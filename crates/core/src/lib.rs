//! # AgendaSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for calendar, token, and store access
//! - The OAuth credential manager
//! - The sync orchestrator and batch coordinator
//! - The availability engine
//!
//! ## Architecture Principles
//! - Only depends on `agendasync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod auth;
pub mod scheduling;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

// Re-export specific items to avoid ambiguity
pub use auth::manager::CredentialManager;
pub use auth::ports::{CredentialStore, TokenEndpoint};
pub use scheduling::availability::{find_slots, merge_busy_intervals};
pub use scheduling::AvailabilityService;
pub use sync::batch::BatchCoordinator;
pub use sync::event::build_event_payload;
pub use sync::orchestrator::SyncOrchestrator;
pub use sync::ports::{CalendarApi, SyncRecordRepository};
