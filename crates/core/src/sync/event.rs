//! Calendar event payload construction
//!
//! Builds the provider-shaped event content from an appointment snapshot.
//! Pure; network and persistence stay in the orchestrator.

use agendasync_domain::{
    AppointmentSnapshot, EventAttendee, EventPayload, EventReminder,
};
use tracing::warn;

/// Build the outbound event payload for an appointment.
///
/// Title and description mirror what the clinic's staff expect to see in
/// their calendar: "<type> - <patient>" plus a detail block. Attendees are
/// the professional and, when known, the patient.
#[must_use]
pub fn build_event_payload(snapshot: &AppointmentSnapshot, time_zone: &str) -> EventPayload {
    let title = format!("{} - {}", snapshot.appointment_type, snapshot.patient_name);

    let mut attendees = Vec::with_capacity(2);
    push_attendee(&mut attendees, &snapshot.professional_email, &snapshot.professional_name);
    if let Some(patient_email) = &snapshot.patient_email {
        push_attendee(&mut attendees, patient_email, &snapshot.patient_name);
    }

    EventPayload {
        title,
        description: Some(build_description(snapshot)),
        start: snapshot.start,
        end: snapshot.end,
        time_zone: time_zone.to_string(),
        attendees,
        location: snapshot.location.clone(),
        color_tag: None,
        reminders: EventReminder::defaults(),
        appointment_id: snapshot.appointment_id.clone(),
    }
}

fn build_description(snapshot: &AppointmentSnapshot) -> String {
    let mut lines = vec![
        format!("Patient: {}", snapshot.patient_name),
        format!("Type: {}", snapshot.appointment_type),
        format!("Professional: {}", snapshot.professional_name),
    ];

    if let Some(email) = &snapshot.patient_email {
        lines.insert(1, format!("Email: {email}"));
    }
    if let Some(location) = &snapshot.location {
        lines.push(format!("Location: {location}"));
    }
    if let Some(notes) = &snapshot.notes {
        lines.push(format!("Notes: {notes}"));
    }

    lines.push(String::new());
    lines.push("Synced automatically by AgendaSync.".to_string());
    lines.join("\n")
}

/// Keep malformed emails (provider data is validated server-side) but log
/// them; drop only empties, which the provider rejects outright.
fn push_attendee(attendees: &mut Vec<EventAttendee>, email: &str, display_name: &str) {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        warn!(display_name, "skipping attendee with empty email");
        return;
    }
    if !trimmed.contains('@') {
        warn!(email = trimmed, "attendee email missing @ symbol");
    }
    attendees.push(EventAttendee {
        email: trimmed.to_string(),
        display_name: Some(display_name.to_string()),
    });
}
