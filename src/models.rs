use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::{MoodError, Result};

/// Discrete label summarising the next few hours of weather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    Snow,
    Showers,
    Rain,
    Cold,
    Sunshine,
    Overcast,
    Clear,
    Unknown,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 8] = [
        WeatherCondition::Snow,
        WeatherCondition::Showers,
        WeatherCondition::Rain,
        WeatherCondition::Cold,
        WeatherCondition::Sunshine,
        WeatherCondition::Overcast,
        WeatherCondition::Clear,
        WeatherCondition::Unknown,
    ];

    /// Lower-case name, also the key used in the color mapping table.
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::Snow => "snow",
            WeatherCondition::Showers => "showers",
            WeatherCondition::Rain => "rain",
            WeatherCondition::Cold => "cold",
            WeatherCondition::Sunshine => "sunshine",
            WeatherCondition::Overcast => "overcast",
            WeatherCondition::Clear => "clear",
            WeatherCondition::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One forecast hour. Index 0 of a sample set is "now".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlySample {
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub precipitation_probability_pct: i32,
}

impl HourlySample {
    pub fn new(temperature_c: f64, precipitation_mm: f64, precipitation_probability_pct: i32) -> Self {
        Self { temperature_c, precipitation_mm, precipitation_probability_pct }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAnalysis {
    pub analysis_time: DateTime<Utc>,
    pub condition: WeatherCondition,
    pub is_raining: bool,
    pub will_rain_soon: bool,
    pub is_very_cold: bool,
    pub will_be_very_cold: bool,
    pub max_precipitation_probability_pct: i32,
    pub max_precipitation_amount_mm: f64,
    pub current_temperature_c: f64,
    pub min_temperature_c: f64,
    pub summary: String,
}

impl WeatherAnalysis {
    /// Degenerate analysis produced when no usable forecast is available.
    pub fn unknown(reason: &str) -> Self {
        Self {
            analysis_time: Utc::now(),
            condition: WeatherCondition::Unknown,
            is_raining: false,
            will_rain_soon: false,
            is_very_cold: false,
            will_be_very_cold: false,
            max_precipitation_probability_pct: 0,
            max_precipitation_amount_mm: 0.0,
            current_temperature_c: 0.0,
            min_temperature_c: 0.0,
            summary: format!("Error: {}", reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorRgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorRgb {
    pub const WHITE: ColorRgb = ColorRgb { r: 255, g: 255, b: 255 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for ColorRgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {})", self.r, self.g, self.b)
    }
}

/// A light known to the bridge. The bridge owns its state; this is a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Light {
    pub id: String,
    pub name: String,
    pub on: bool,
}

impl Light {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), on: false }
    }
}

/// Open-Meteo forecast body. Only the hourly block is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    pub hourly: Option<HourlyData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyData {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<f64>,
    #[serde(default)]
    pub precipitation_probability: Vec<i32>,
    #[serde(default)]
    pub precipitation: Vec<f64>,
}

impl HourlyData {
    /// Zips the parallel hourly arrays into samples.
    ///
    /// The three measurement arrays must be non-empty and of equal length.
    pub fn samples(&self) -> Result<Vec<HourlySample>> {
        let len = self.temperature_2m.len();
        if len == 0 {
            return Err(MoodError::MalformedForecast("no hourly samples".to_string()));
        }
        if self.precipitation.len() != len || self.precipitation_probability.len() != len {
            return Err(MoodError::MalformedForecast(format!(
                "hourly arrays differ in length (temperature {}, precipitation {}, probability {})",
                len,
                self.precipitation.len(),
                self.precipitation_probability.len()
            )));
        }

        Ok(self.temperature_2m.iter()
            .zip(&self.precipitation)
            .zip(&self.precipitation_probability)
            .map(|((&t, &p), &prob)| HourlySample::new(t, p, prob))
            .collect())
    }
}

/// Entry returned by the Hue discovery endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredBridge {
    pub id: String,
    #[serde(rename = "internalipaddress")]
    pub internal_ip_address: String,
}
