//! Inserting an event into a Google calendar.

use anyhow::{Context, Result};
use daycount_core::EventSpec;
use google_calendar::types::SendUpdates;

use crate::google_event::ToGoogle;
use crate::session::{AuthContext, GoogleAuthorizer};

pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// What Google reports back for a created event.
#[derive(Debug, Clone)]
pub struct InsertedEvent {
    pub id: String,
    pub html_link: String,
}

/// Insert `spec` into `calendar_id`, acquiring authorization as needed.
pub async fn insert_event(
    auth: &mut AuthContext<GoogleAuthorizer>,
    spec: &EventSpec,
    calendar_id: &str,
) -> Result<InsertedEvent> {
    // Build the payload before touching the network, so invalid input never
    // triggers a consent flow.
    let google_event = spec.to_google()?;

    let session = auth.acquire().await?.clone();
    let client = session.client(auth.authorizer().credentials());

    tracing::debug!(calendar_id, summary = %google_event.summary, "inserting Google event");

    let response = client
        .events()
        .insert(
            calendar_id,
            0,
            0,
            false,
            SendUpdates::None,
            false,
            &google_event,
        )
        .await
        .with_context(|| format!("Failed to create event: {}", &google_event.summary))?;

    let created = response.body;

    Ok(InsertedEvent {
        id: created.id,
        html_link: created.html_link,
    })
}
