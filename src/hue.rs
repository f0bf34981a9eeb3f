//! Philips Hue bridge client (local REST API v1).
//!
//! The engine only needs two things from a lighting provider, captured by
//! [`LightProvider`]: the list of addressable lights and a way to set one
//! light's color. [`HueService`] adds bridge discovery and caches the
//! connection between cycles.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::HueConfig;
use crate::error::{MoodError, Result};
use crate::models::{ColorRgb, DiscoveredBridge, Light};
use crate::targets::LightTargetConfig;

const DISCOVERY_URL: &str = "https://discovery.meethue.com/";
const LINK_BUTTON_NOT_PRESSED: i64 = 101;

#[async_trait]
pub trait LightProvider: Send + Sync {
    async fn lights(&self) -> Result<Vec<Light>>;
    async fn set_color(&self, light: &Light, color: ColorRgb) -> Result<()>;
}

fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// An authenticated connection to one bridge.
pub struct HueBridge {
    client: Client,
    ip: String,
    base_url: String,
}

impl HueBridge {
    pub fn new(ip: &str, api_key: &str) -> Self {
        Self {
            client: http_client(),
            ip: ip.to_string(),
            base_url: format!("http://{}/api/{}", ip, api_key),
        }
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    /// Returns the IP of the first bridge the discovery service reports.
    pub async fn discover(timeout: Duration) -> Result<Option<String>> {
        let client = http_client();
        let resp = tokio::time::timeout(timeout, client.get(DISCOVERY_URL).send())
            .await
            .map_err(|_| MoodError::ProviderUnavailable("bridge discovery timed out".to_string()))??;
        let bridges: Vec<DiscoveredBridge> = resp.error_for_status()?.json().await?;
        for bridge in &bridges {
            log::debug!("Found bridge: {} at {}", bridge.id, bridge.internal_ip_address);
        }
        Ok(bridges.into_iter().next().map(|b| b.internal_ip_address))
    }

    /// Registers a new API user. The bridge's link button must have been pressed.
    pub async fn pair(ip: &str, app_name: &str) -> Result<String> {
        let client = http_client();
        let body = json!({ "devicetype": format!("{}#huemood", app_name) });
        let reply: Value = client.post(format!("http://{}/api", ip))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        check_reply(&reply)?;

        reply.as_array()
            .and_then(|entries| entries.iter().find_map(|e| e.pointer("/success/username")))
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| MoodError::Bridge { code: 0, description: format!("unexpected pairing reply: {}", reply) })
    }
}

#[async_trait]
impl LightProvider for HueBridge {
    async fn lights(&self) -> Result<Vec<Light>> {
        let reply: Value = self.client.get(format!("{}/lights", self.base_url))
            .send()
            .await?
            .json()
            .await?;
        check_reply(&reply)?;
        Ok(parse_lights(&reply))
    }

    async fn set_color(&self, light: &Light, color: ColorRgb) -> Result<()> {
        let (xy, bri) = rgb_to_xy(color);
        let body = json!({ "on": true, "xy": xy, "bri": bri });
        let reply: Value = self.client.put(format!("{}/lights/{}/state", self.base_url, light.id))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        check_reply(&reply)
    }
}

/// The bridge answers errors with 200 and a list of `{"error": {...}}` entries.
fn check_reply(reply: &Value) -> Result<()> {
    let Some(entries) = reply.as_array() else {
        return Ok(());
    };
    for entry in entries {
        if let Some(err) = entry.get("error") {
            let code = err.get("type").and_then(|v| v.as_i64()).unwrap_or(0);
            if code == LINK_BUTTON_NOT_PRESSED {
                return Err(MoodError::LinkButton);
            }
            let description = err.get("description").and_then(|v| v.as_str()).unwrap_or("").to_string();
            return Err(MoodError::Bridge { code, description });
        }
    }
    Ok(())
}

fn parse_lights(reply: &Value) -> Vec<Light> {
    let Some(map) = reply.as_object() else {
        return Vec::new();
    };
    map.iter()
        .map(|(id, v)| Light {
            id: id.clone(),
            name: v.get("name").and_then(|n| n.as_str()).unwrap_or("").to_string(),
            on: v.pointer("/state/on").and_then(|o| o.as_bool()).unwrap_or(false),
        })
        .collect()
}

// sRGB companding, as the bridge expects linear light before the matrix.
fn degamma(val: u8) -> f64 {
    let v = val as f64 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Converts to the CIE xy point and brightness the bridge takes on the wire.
pub fn rgb_to_xy(color: ColorRgb) -> ([f64; 2], u8) {
    let (r, g, b) = (degamma(color.r), degamma(color.g), degamma(color.b));

    // Wide gamut D65
    let x = r * 0.664511 + g * 0.154324 + b * 0.162028;
    let y = r * 0.283881 + g * 0.668433 + b * 0.047685;
    let z = r * 0.000088 + g * 0.072310 + b * 0.986039;

    let sum = x + y + z;
    let xy = if sum == 0.0 {
        [0.3227, 0.3290]
    } else {
        [round4(x / sum), round4(y / sum)]
    };

    let max = color.r.max(color.g).max(color.b) as f64;
    let bri = (max / 255.0 * 254.0).round().clamp(1.0, 254.0) as u8;
    (xy, bri)
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Lazily connected bridge, driven by [`HueConfig`].
pub struct HueService {
    config: HueConfig,
    bridge: Mutex<Option<Arc<HueBridge>>>,
}

impl HueService {
    pub fn new(config: HueConfig) -> Self {
        Self {
            config,
            bridge: Mutex::new(None),
        }
    }

    pub async fn connection(&self) -> Result<Arc<HueBridge>> {
        let mut cached = self.bridge.lock().await;
        if let Some(bridge) = cached.as_ref() {
            return Ok(Arc::clone(bridge));
        }

        let ip = self.bridge_ip().await?;

        if self.config.api_key.is_empty() {
            log::warn!("Hue API key not configured. Press the button on your Hue bridge and run `huemood pair`.");
            return Err(MoodError::ProviderUnavailable("Hue API key not configured".to_string()));
        }

        let bridge = Arc::new(HueBridge::new(&ip, &self.config.api_key));
        log::info!("Connected to Hue bridge at {}", ip);
        *cached = Some(Arc::clone(&bridge));
        Ok(bridge)
    }

    /// Configured IP, or the first discovered bridge when auto discovery is on.
    pub async fn bridge_ip(&self) -> Result<String> {
        if !self.config.bridge_ip.is_empty() {
            return Ok(self.config.bridge_ip.clone());
        }
        if !self.config.auto_discover_bridge {
            return Err(MoodError::ProviderUnavailable("no bridge IP configured".to_string()));
        }

        log::info!("Bridge IP not configured, attempting to discover Hue bridges...");
        match HueBridge::discover(Duration::from_secs(self.config.discovery_timeout_secs)).await? {
            Some(ip) => {
                log::info!("Discovered Hue bridge at: {}", ip);
                Ok(ip)
            }
            None => {
                log::warn!("No Hue bridges found on the network");
                Err(MoodError::ProviderUnavailable("no Hue bridge found".to_string()))
            }
        }
    }

    async fn reset(&self) {
        *self.bridge.lock().await = None;
    }

    /// Logs the bridge's lights and whether the configured target exists.
    pub async fn list_lights(&self) -> Result<Vec<Light>> {
        let lights = self.lights().await?;
        if lights.is_empty() {
            log::info!("No lights found on the Hue bridge");
            return Ok(lights);
        }

        log::info!("Found {} lights:", lights.len());
        for light in &lights {
            log::info!("  - {} (ID: {})", light.name, light.id);
        }

        let target = LightTargetConfig::from(&self.config);
        if target.target_all_lights {
            log::info!("Configuration: Targeting ALL lights");
        } else if let Some(name) = target.target_light_name.as_deref() {
            log::info!("Configuration: Targeting specific light: '{}'", name);
            let wanted = name.trim().to_lowercase();
            if !lights.iter().any(|l| l.name.to_lowercase() == wanted) {
                let available: Vec<&str> = lights.iter().map(|l| l.name.as_str()).collect();
                log::warn!("Target light '{}' not found! Available lights: {:?}", name, available);
            }
        }
        Ok(lights)
    }
}

#[async_trait]
impl LightProvider for HueService {
    async fn lights(&self) -> Result<Vec<Light>> {
        let bridge = self.connection().await?;
        match bridge.lights().await {
            Ok(lights) => Ok(lights),
            Err(e) => {
                // Stale connection: rediscover on the next cycle.
                self.reset().await;
                Err(e)
            }
        }
    }

    async fn set_color(&self, light: &Light, color: ColorRgb) -> Result<()> {
        self.connection().await?.set_color(light, color).await
    }
}
