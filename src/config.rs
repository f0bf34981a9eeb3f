use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub weather: WeatherConfig,
    pub hue: HueConfig,
    pub color_mapping: ColorMappingConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherConfig {
    pub api_url: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub forecast_hours: u32,
    pub cold_threshold: f64,
    pub rain_probability_threshold: i32,
    pub rain_amount_threshold: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            latitude: 47.3769,
            longitude: 8.5417,
            timezone: "Europe/Berlin".to_string(),
            forecast_hours: 8,
            cold_threshold: 5.0,
            rain_probability_threshold: 30,
            rain_amount_threshold: 0.1,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct HueConfig {
    pub bridge_ip: String,
    pub api_key: String,
    pub app_name: String,
    pub auto_discover_bridge: bool,
    pub discovery_timeout_secs: u64,
    pub target_light_name: Option<String>,
    pub target_all_lights: bool,
}

impl Default for HueConfig {
    fn default() -> Self {
        Self {
            bridge_ip: "".to_string(),
            api_key: "".to_string(),
            app_name: "HueMoodOrologist".to_string(),
            auto_discover_bridge: true,
            discovery_timeout_secs: 10,
            target_light_name: None,
            target_all_lights: true,
        }
    }
}

/// Condition name to color spec. Keys are matched lower-cased.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorMappingConfig {
    pub conditions: BTreeMap<String, String>,
    pub default_color: String,
    pub enabled: bool,
}

impl Default for ColorMappingConfig {
    fn default() -> Self {
        let conditions = [
            ("rain", "light purple"),
            ("showers", "dark purple"),
            ("sunshine", "yellow"),
            ("overcast", "grey"),
            ("snow", "white"),
            ("cold", "warm yellow"),
            ("clear", "cool white"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            conditions,
            default_color: "white".to_string(),
            enabled: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleInterval {
    Minute,
    #[default]
    Hour,
    FourHours,
    TwelveHours,
}

impl ScheduleInterval {
    pub fn period(&self) -> Duration {
        match self {
            ScheduleInterval::Minute => Duration::from_secs(60),
            ScheduleInterval::Hour => Duration::from_secs(60 * 60),
            ScheduleInterval::FourHours => Duration::from_secs(4 * 60 * 60),
            ScheduleInterval::TwelveHours => Duration::from_secs(12 * 60 * 60),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScheduleInterval::Minute => "every minute",
            ScheduleInterval::Hour => "every hour",
            ScheduleInterval::FourHours => "every 4 hours",
            ScheduleInterval::TwelveHours => "every 12 hours",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleConfig {
    pub interval: ScheduleInterval,
    pub initial_delay_seconds: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: ScheduleInterval::Hour,
            initial_delay_seconds: 5,
        }
    }
}

impl AppConfig {
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

pub fn get_config_path() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("HueMood");
    path.push("config.json");
    path
}

/// Loads the config at `path`, or defaults when it is missing or unreadable.
pub fn load_config(path: &Path) -> AppConfig {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => {
            log::info!("No config at {}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match serde_json::from_str(&data) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Ignoring unreadable config {}: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    config.save_to(path)
}
