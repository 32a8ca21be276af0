//! OpenWeather 5 day / 3 hour forecast.

use crate::http::{decode, ensure_success, transport_error};
use farmlink_core::environment::{BoxFuture, WeatherProvider};
use farmlink_core::{ForecastBucket, ProviderError};
use reqwest::Client;
use serde::Deserialize;

/// Default forecast endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openweathermap.org/data/2.5/forecast";

const PROVIDER: &str = "OpenWeather";

#[derive(Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastEntry>,
}

#[derive(Deserialize)]
struct ForecastEntry {
    pop: Option<f64>,
}

/// [`WeatherProvider`] for the OpenWeather forecast API.
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl OpenWeatherClient {
    /// Create a client. Without an API key every forecast fails with
    /// [`ProviderError::NotConfigured`].
    #[must_use]
    pub fn new(client: Client, api_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    async fn fetch(&self, lat: f64, lon: f64) -> Result<Vec<ForecastBucket>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("OPENWEATHER_API_KEY".to_string()))?;

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("lat", lat.to_string()), ("lon", lon.to_string()), ("appid", api_key.to_string())])
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        let response = ensure_success(PROVIDER, response).await?;
        let forecast: ForecastResponse = decode(PROVIDER, response).await?;

        Ok(forecast
            .list
            .into_iter()
            .map(|entry| ForecastBucket { pop: entry.pop })
            .collect())
    }
}

impl WeatherProvider for OpenWeatherClient {
    fn forecast(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<Vec<ForecastBucket>, ProviderError>> {
        Box::pin(async move {
            let buckets = self.fetch(lat, lon).await?;
            tracing::debug!(lat, lon, buckets = buckets.len(), "Forecast fetched");
            Ok(buckets)
        })
    }
}
