//! Domain constants

/// Seconds before expiry at which an access token is considered stale and
/// refreshed ahead of use.
pub const DEFAULT_REFRESH_SKEW_SECONDS: i64 = 300;

/// Default slot-search step in minutes.
pub const DEFAULT_STEP_MINUTES: u32 = 30;

/// Default bounded concurrency for batch synchronization.
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;

/// Maximum number of events returned by a single list call.
pub const LIST_EVENTS_MAX_RESULTS: u32 = 250;

/// Reminder lead times in minutes applied to created events (24 hours and
/// 1 hour before the appointment).
pub const REMINDER_LEAD_MINUTES: [u32; 2] = [24 * 60, 60];

/// Marker stored in an event's private extended properties so events created
/// by the engine can be told apart from foreign calendar entries.
pub const EVENT_SOURCE_TAG: &str = "agendasync";

/// Calendar identifier used when a query does not name any calendars.
pub const PRIMARY_CALENDAR_ID: &str = "primary";
