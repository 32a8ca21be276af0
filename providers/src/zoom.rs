//! Zoom meetings via Server-to-Server OAuth.

use crate::http::{decode, ensure_success, transport_error};
use farmlink_core::environment::{BoxFuture, MeetingLinkProvider, MeetingRequest};
use farmlink_core::{MeetingProviderKind, ProviderError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default REST API base.
pub const DEFAULT_API_URL: &str = "https://api.zoom.us/v2";

/// Default OAuth token endpoint.
pub const DEFAULT_OAUTH_URL: &str = "https://zoom.us/oauth/token";

const PROVIDER: &str = "Zoom";

/// Tokens are refreshed this long before Zoom says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Server-to-Server OAuth app credentials.
#[derive(Clone)]
pub struct ZoomCredentials {
    /// Zoom account id
    pub account_id: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
}

impl fmt::Debug for ZoomCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoomCredentials")
            .field("account_id", &self.account_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Serialize)]
struct CreateMeetingBody<'a> {
    topic: &'a str,
    #[serde(rename = "type")]
    kind: u8,
    start_time: String,
    duration: i64,
    timezone: &'a str,
    settings: MeetingSettings,
}

#[derive(Serialize)]
struct MeetingSettings {
    join_before_host: bool,
    waiting_room: bool,
}

#[derive(Deserialize)]
struct MeetingResponse {
    join_url: Option<String>,
}

/// [`MeetingLinkProvider`] that schedules Zoom meetings on the account owner.
#[derive(Clone, Debug)]
pub struct ZoomMeetingProvider {
    client: Client,
    api_url: String,
    oauth_url: String,
    credentials: Option<ZoomCredentials>,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedToken").finish_non_exhaustive()
    }
}

impl ZoomMeetingProvider {
    /// Create a provider against the public Zoom endpoints.
    #[must_use]
    pub fn new(client: Client, credentials: Option<ZoomCredentials>) -> Self {
        Self::with_urls(client, DEFAULT_API_URL, DEFAULT_OAUTH_URL, credentials)
    }

    /// Create a provider against custom endpoints.
    #[must_use]
    pub fn with_urls(
        client: Client,
        api_url: &str,
        oauth_url: &str,
        credentials: Option<ZoomCredentials>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            oauth_url: oauth_url.to_string(),
            credentials,
            token: Arc::new(Mutex::new(None)),
        }
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("ZOOM_CLIENT_ID".to_string()))?;

        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.value.clone());
        }

        let response = self
            .client
            .post(&self.oauth_url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .query(&[
                ("grant_type", "account_credentials"),
                ("account_id", credentials.account_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        let response = ensure_success(PROVIDER, response).await?;
        let token: TokenResponse = decode(PROVIDER, response).await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    async fn schedule(&self, request: &MeetingRequest) -> Result<String, ProviderError> {
        let token = self.access_token().await?;
        let duration = (request.end_utc - request.start_utc).num_minutes().max(1);

        let response = self
            .client
            .post(format!("{}/users/me/meetings", self.api_url))
            .bearer_auth(token)
            .json(&CreateMeetingBody {
                topic: &request.topic,
                kind: 2,
                start_time: request.start_utc.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                duration,
                timezone: "UTC",
                settings: MeetingSettings {
                    join_before_host: false,
                    waiting_room: true,
                },
            })
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        let response = ensure_success(PROVIDER, response).await?;
        let meeting: MeetingResponse = decode(PROVIDER, response).await?;

        meeting
            .join_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: PROVIDER.to_string(),
                message: "join_url missing".to_string(),
            })
    }
}

impl MeetingLinkProvider for ZoomMeetingProvider {
    fn kind(&self) -> MeetingProviderKind {
        MeetingProviderKind::Zoom
    }

    fn create_meeting(&self, request: MeetingRequest) -> BoxFuture<'_, Result<String, ProviderError>> {
        Box::pin(async move {
            let link = self.schedule(&request).await?;
            tracing::info!(booking_id = %request.booking_id, "Zoom meeting scheduled");
            Ok(link)
        })
    }
}
