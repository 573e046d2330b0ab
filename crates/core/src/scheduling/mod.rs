//! Availability computation and slot search

pub mod availability;

pub use availability::{find_slots, merge_busy_intervals, AvailabilityService};
