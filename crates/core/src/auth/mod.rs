//! OAuth credential lifecycle
//!
//! The credential manager is the single owner of stored provider
//! credentials: token reads, refreshes, connects, and revocations all flow
//! through it.

pub mod manager;
pub mod ports;

pub use manager::CredentialManager;
pub use ports::{CredentialStore, TokenEndpoint};
