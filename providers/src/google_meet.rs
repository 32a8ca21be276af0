//! Google Meet links through Google Calendar event conferencing.

use crate::http::{decode, ensure_success, transport_error};
use farmlink_core::environment::{BoxFuture, MeetingLinkProvider, MeetingRequest};
use farmlink_core::{MeetingProviderKind, ProviderError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Calendar API base.
pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/calendar/v3";

const PROVIDER: &str = "Google Calendar";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventBody<'a> {
    summary: &'a str,
    start: EventTime,
    end: EventTime,
    attendees: [Attendee<'a>; 2],
    conference_data: ConferenceData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    date_time: String,
    time_zone: &'static str,
}

#[derive(Serialize)]
struct Attendee<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConferenceData {
    create_request: CreateRequest,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest {
    request_id: String,
    conference_solution_key: SolutionKey,
}

#[derive(Serialize)]
struct SolutionKey {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventResponse {
    hangout_link: Option<String>,
}

/// [`MeetingLinkProvider`] that creates a Calendar event with a Meet conference.
#[derive(Clone)]
pub struct GoogleMeetProvider {
    client: Client,
    api_url: String,
    calendar_id: String,
    access_token: Option<String>,
}

impl fmt::Debug for GoogleMeetProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleMeetProvider")
            .field("api_url", &self.api_url)
            .field("calendar_id", &self.calendar_id)
            .finish_non_exhaustive()
    }
}

impl GoogleMeetProvider {
    /// Create a provider writing events into `calendar_id`.
    #[must_use]
    pub fn new(client: Client, api_url: &str, calendar_id: &str, access_token: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            calendar_id: calendar_id.to_string(),
            access_token: access_token.filter(|token| !token.is_empty()),
        }
    }

    async fn insert_event(&self, request: &MeetingRequest) -> Result<String, ProviderError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("GOOGLE_CALENDAR_ACCESS_TOKEN".to_string()))?;

        let body = EventBody {
            summary: &request.topic,
            start: EventTime {
                date_time: request.start_utc.to_rfc3339(),
                time_zone: "UTC",
            },
            end: EventTime {
                date_time: request.end_utc.to_rfc3339(),
                time_zone: "UTC",
            },
            attendees: [
                Attendee {
                    email: &request.expert_email,
                },
                Attendee {
                    email: &request.farmer_email,
                },
            ],
            conference_data: ConferenceData {
                create_request: CreateRequest {
                    // Stable per booking so a retried insert reuses the conference.
                    request_id: format!("farmlink-booking-{}", request.booking_id),
                    conference_solution_key: SolutionKey { kind: "hangoutsMeet" },
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/calendars/{}/events", self.api_url, self.calendar_id))
            .query(&[("conferenceDataVersion", "1"), ("sendUpdates", "none")])
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        let response = ensure_success(PROVIDER, response).await?;
        let event: EventResponse = decode(PROVIDER, response).await?;

        event
            .hangout_link
            .filter(|link| !link.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: PROVIDER.to_string(),
                message: "hangoutLink missing".to_string(),
            })
    }
}

impl MeetingLinkProvider for GoogleMeetProvider {
    fn kind(&self) -> MeetingProviderKind {
        MeetingProviderKind::Google
    }

    fn create_meeting(&self, request: MeetingRequest) -> BoxFuture<'_, Result<String, ProviderError>> {
        Box::pin(async move {
            let link = self.insert_event(&request).await?;
            tracing::info!(booking_id = %request.booking_id, "Google Meet scheduled");
            Ok(link)
        })
    }
}
