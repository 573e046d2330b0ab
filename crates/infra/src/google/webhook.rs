//! Inbound notification stub
//!
//! Interface point for future two-way sync. Push notifications from the
//! provider are acknowledged and logged; no inbound reconciliation happens
//! yet.

use std::collections::HashMap;

use agendasync_domain::Result;
use tracing::{debug, info};

/// Channel id header set when the notification belongs to a watch channel.
const CHANNEL_ID_HEADER: &str = "x-goog-channel-id";
/// Resource state header: "sync", "exists", or "not_exists".
const RESOURCE_STATE_HEADER: &str = "x-goog-resource-state";
const RESOURCE_ID_HEADER: &str = "x-goog-resource-id";

/// Accept a provider push notification.
///
/// Current behaviour is log-and-ignore; the payload shape is recorded so a
/// future inbound sync can pick up from here.
pub fn handle_provider_notification(
    headers: &HashMap<String, String>,
    body: &[u8],
) -> Result<()> {
    let channel_id = headers.get(CHANNEL_ID_HEADER).map(String::as_str).unwrap_or("<none>");
    let resource_state =
        headers.get(RESOURCE_STATE_HEADER).map(String::as_str).unwrap_or("<none>");
    let resource_id = headers.get(RESOURCE_ID_HEADER).map(String::as_str).unwrap_or("<none>");

    info!(
        channel_id,
        resource_state,
        resource_id,
        body_bytes = body.len(),
        "provider notification received; inbound sync not enabled, ignoring"
    );

    if resource_state == "sync" {
        debug!(channel_id, "watch channel handshake acknowledged");
    }

    Ok(())
}
