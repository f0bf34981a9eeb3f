use async_trait::async_trait;
use reqwest::Client;

use crate::classifier::{classify, Thresholds};
use crate::config::WeatherConfig;
use crate::error::{MoodError, Result};
use crate::models::{ForecastResponse, WeatherAnalysis};

/// Anything that can produce an hourly forecast for the configured location.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_forecast(&self) -> Result<ForecastResponse>;
}

pub struct WeatherService {
    client: Client,
    config: WeatherConfig,
}

impl WeatherService {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }

    pub fn forecast_url(&self) -> String {
        format!(
            "{}?latitude={}&longitude={}&hourly=temperature_2m,precipitation_probability,precipitation&timezone={}&forecast_hours={}",
            self.config.api_url,
            self.config.latitude,
            self.config.longitude,
            urlencoding::encode(&self.config.timezone),
            self.config.forecast_hours
        )
    }
}

#[async_trait]
impl ForecastSource for WeatherService {
    async fn fetch_forecast(&self) -> Result<ForecastResponse> {
        log::info!("Fetching weather data from Open-Meteo API");
        let resp = self.client.get(self.forecast_url())
            .send()
            .await
            .map_err(|e| MoodError::ProviderUnavailable(e.to_string()))?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

/// Classifies a parsed response. A missing response or hourly block is `unknown`.
pub fn analyze_response(response: Option<&ForecastResponse>, thresholds: &Thresholds) -> WeatherAnalysis {
    let Some(hourly) = response.and_then(|r| r.hourly.as_ref()) else {
        log::error!("Invalid weather response received");
        return WeatherAnalysis::unknown("Invalid weather data received");
    };

    match hourly.samples() {
        Ok(samples) => classify(&samples, thresholds),
        Err(e) => {
            log::error!("Invalid weather response received: {}", e);
            WeatherAnalysis::unknown(&e.to_string())
        }
    }
}

/// Fetches and classifies in one step, degrading to `unknown` on any failure.
pub async fn fetch_and_analyze(source: &dyn ForecastSource, thresholds: &Thresholds) -> WeatherAnalysis {
    match source.fetch_forecast().await {
        Ok(response) => analyze_response(Some(&response), thresholds),
        Err(e) => {
            log::error!("Error fetching weather data: {}", e);
            WeatherAnalysis::unknown(&format!("Error fetching weather: {}", e))
        }
    }
}
