pub mod models;
pub mod config;
pub mod error;
pub mod color;
pub mod classifier;
pub mod mood;
pub mod targets;
pub mod weather;
pub mod hue;

use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

use crate::classifier::Thresholds;
use crate::config::AppConfig;
use crate::error::MoodError;
use crate::hue::LightProvider;
use crate::models::{ColorRgb, WeatherAnalysis};
use crate::mood::ColorStrategy;
use crate::targets::{select, LightTargetConfig};
use crate::weather::{fetch_and_analyze, ForecastSource};

/// What one pipeline run decided and did.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub analysis: WeatherAnalysis,
    pub color_spec: String,
    pub color: ColorRgb,
    /// Names of lights that accepted the color.
    pub applied: Vec<String>,
    /// Names of lights that failed, with the reason.
    pub failed: Vec<(String, String)>,
}

/// Forecast -> condition -> color, then the color onto every targeted light.
///
/// Lights are updated concurrently and independently: one failing light does
/// not stop the others, and nothing is rolled back.
pub async fn run_one_cycle(
    forecasts: &dyn ForecastSource,
    lights: &dyn LightProvider,
    config: &AppConfig,
) -> CycleReport {
    log::info!("Starting weather check");

    let analysis = fetch_and_analyze(forecasts, &Thresholds::from(&config.weather)).await;
    log_analysis(&analysis);

    let strategy = ColorStrategy::from_config(&config.color_mapping);
    let color_spec = strategy.color_for(&analysis);
    let color = color::resolve(&color_spec);

    let mut report = CycleReport {
        analysis,
        color_spec,
        color,
        applied: Vec::new(),
        failed: Vec::new(),
    };

    let all_lights = match lights.lights().await {
        Ok(all) => all,
        Err(e) => {
            log::error!("Cannot reach lights, skipping update: {}", e);
            return report;
        }
    };

    let targets = select(&all_lights, &LightTargetConfig::from(&config.hue));
    if targets.is_empty() {
        let wanted = config.hue.target_light_name.clone().unwrap_or_else(|| "all".to_string());
        log::warn!("{}", MoodError::NoTargetLights(wanted));
        return report;
    }

    log::info!(
        "Controlling {} light(s) for weather condition: {}",
        targets.len(),
        report.analysis.condition
    );

    let results = join_all(targets.iter().map(|light| async move {
        (light, lights.set_color(light, color).await)
    }))
    .await;

    for (light, result) in results {
        match result {
            Ok(()) => {
                log::info!("Set {} to {} mood ({})", light.name, report.analysis.condition, color);
                report.applied.push(light.name.clone());
            }
            Err(e) => {
                let failure = MoodError::PerLightApplyFailure {
                    light: light.name.clone(),
                    reason: e.to_string(),
                };
                log::error!("{}", failure);
                report.failed.push((light.name.clone(), e.to_string()));
            }
        }
    }

    report
}

fn log_analysis(analysis: &WeatherAnalysis) {
    log::info!("Weather Analysis Results:");
    log::info!("  - Condition: {}", analysis.condition);
    log::info!("  - Is Raining: {}", analysis.is_raining);
    log::info!("  - Will Rain Soon: {}", analysis.will_rain_soon);
    log::info!("  - Max Precipitation Probability: {}%", analysis.max_precipitation_probability_pct);
    log::info!("  - Is Very Cold: {}", analysis.is_very_cold);
    log::info!("  - Will Be Very Cold: {}", analysis.will_be_very_cold);
    log::info!("  - Current Temperature: {}°C", analysis.current_temperature_c);
    log::info!("  - Summary: {}", analysis.summary);
}

/// Fires `shutdown` once `signal` completes.
///
/// If the signal cannot be listened for, the sender is kept alive forever so
/// the scheduler keeps running instead of seeing a closed channel.
pub async fn forward_shutdown<F>(signal: F, shutdown: watch::Sender<()>)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            log::info!("Received Ctrl+C, shutting down gracefully...");
            let _ = shutdown.send(());
        }
        Err(e) => {
            log::error!("Unable to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Runs a cycle after the initial delay and then once per interval, until
/// `shutdown` fires or its sender is dropped.
pub async fn run_scheduler(
    forecasts: &dyn ForecastSource,
    lights: &dyn LightProvider,
    config: &AppConfig,
    mut shutdown: watch::Receiver<()>,
) {
    let period = config.schedule.interval.period();
    let initial_delay = Duration::from_secs(config.schedule.initial_delay_seconds);
    log::info!(
        "Initializing weather check scheduler: {} ({}s interval)",
        config.schedule.interval.description(),
        period.as_secs()
    );

    tokio::select! {
        _ = shutdown.changed() => {
            log::info!("Shutdown before first weather check");
            return;
        }
        _ = tokio::time::sleep(initial_delay) => {}
    }

    log::info!("Weather check scheduler started after initial delay of {}s", initial_delay.as_secs());

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                log::info!("Shutdown signal received, stopping scheduler");
                break;
            }
            _ = ticker.tick() => {
                let report = run_one_cycle(forecasts, lights, config).await;
                log::debug!(
                    "Cycle finished: {} applied, {} failed",
                    report.applied.len(),
                    report.failed.len()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorMappingConfig;
    use crate::error::Result;
    use crate::models::{ForecastResponse, HourlyData, Light, WeatherCondition};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    struct FixedForecast(Option<HourlyData>);

    #[async_trait]
    impl ForecastSource for FixedForecast {
        async fn fetch_forecast(&self) -> Result<ForecastResponse> {
            match &self.0 {
                Some(hourly) => Ok(ForecastResponse { hourly: Some(hourly.clone()), ..Default::default() }),
                None => Err(MoodError::ProviderUnavailable("offline".to_string())),
            }
        }
    }

    fn rainy() -> FixedForecast {
        FixedForecast(Some(HourlyData {
            time: vec![],
            temperature_2m: vec![15.0, 14.0, 13.0],
            precipitation_probability: vec![35, 40, 30],
            precipitation: vec![0.2, 0.3, 0.1],
        }))
    }

    /// In-memory bridge. Lights named in `broken` reject updates.
    struct FakeBridge {
        lights: Vec<Light>,
        broken: Vec<String>,
        reachable: bool,
        applied: Mutex<Vec<(String, ColorRgb)>>,
    }

    impl FakeBridge {
        fn new(names: &[&str]) -> Self {
            Self {
                lights: names.iter().enumerate().map(|(i, n)| Light::new((i + 1).to_string(), *n)).collect(),
                broken: Vec::new(),
                reachable: true,
                applied: Mutex::new(Vec::new()),
            }
        }

        fn applied(&self) -> Vec<(String, ColorRgb)> {
            let mut v = self.applied.lock().unwrap().clone();
            v.sort_by(|a, b| a.0.cmp(&b.0));
            v
        }
    }

    #[async_trait]
    impl LightProvider for FakeBridge {
        async fn lights(&self) -> Result<Vec<Light>> {
            if !self.reachable {
                return Err(MoodError::ProviderUnavailable("bridge offline".to_string()));
            }
            Ok(self.lights.clone())
        }

        async fn set_color(&self, light: &Light, color: ColorRgb) -> Result<()> {
            if self.broken.contains(&light.name) {
                return Err(MoodError::Bridge { code: 201, description: "device is set to off".to_string() });
            }
            self.applied.lock().unwrap().push((light.name.clone(), color));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_cycle_applies_mapped_color_to_all_lights() {
        let bridge = FakeBridge::new(&["Living Room", "Kitchen"]);
        let report = run_one_cycle(&rainy(), &bridge, &AppConfig::default()).await;

        assert_eq!(report.analysis.condition, WeatherCondition::Rain);
        assert_eq!(report.color_spec, "light purple");
        assert_eq!(report.color, ColorRgb::new(221, 160, 221));
        assert_eq!(
            bridge.applied(),
            vec![
                ("Kitchen".to_string(), ColorRgb::new(221, 160, 221)),
                ("Living Room".to_string(), ColorRgb::new(221, 160, 221)),
            ]
        );
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_cycle_targets_named_light() {
        let bridge = FakeBridge::new(&["Living Room", "Kitchen"]);
        let mut config = AppConfig::default();
        config.hue.target_all_lights = false;
        config.hue.target_light_name = Some("living room".to_string());

        let report = run_one_cycle(&rainy(), &bridge, &config).await;
        assert_eq!(report.applied, vec!["Living Room".to_string()]);
    }

    #[tokio::test]
    async fn test_one_failing_light_does_not_stop_others() {
        let mut bridge = FakeBridge::new(&["Living Room", "Kitchen", "Hall"]);
        bridge.broken = vec!["Kitchen".to_string()];

        let report = run_one_cycle(&rainy(), &bridge, &AppConfig::default()).await;
        assert_eq!(report.applied.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "Kitchen");
        assert_eq!(bridge.applied().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_target_skips_update() {
        let bridge = FakeBridge::new(&["Kitchen"]);
        let mut config = AppConfig::default();
        config.hue.target_all_lights = false;
        config.hue.target_light_name = Some("Bedroom".to_string());

        let report = run_one_cycle(&rainy(), &bridge, &config).await;
        assert!(report.applied.is_empty());
        assert!(report.failed.is_empty());
        assert!(bridge.applied().is_empty());
    }

    #[tokio::test]
    async fn test_offline_weather_uses_default_color() {
        let bridge = FakeBridge::new(&["Kitchen"]);
        let report = run_one_cycle(&FixedForecast(None), &bridge, &AppConfig::default()).await;

        assert_eq!(report.analysis.condition, WeatherCondition::Unknown);
        assert_eq!(report.color, ColorRgb::WHITE);
        assert_eq!(report.applied, vec!["Kitchen".to_string()]);
    }

    #[tokio::test]
    async fn test_legacy_mapping_when_table_empty() {
        let bridge = FakeBridge::new(&["Kitchen"]);
        let mut config = AppConfig::default();
        config.color_mapping = ColorMappingConfig {
            conditions: BTreeMap::new(),
            default_color: "magenta".to_string(),
            enabled: true,
        };

        let report = run_one_cycle(&rainy(), &bridge, &config).await;
        assert_eq!(report.color_spec, "rain blue");
        assert_eq!(report.color, ColorRgb::new(100, 149, 237));
    }

    #[tokio::test]
    async fn test_unreachable_bridge_ends_cycle() {
        let mut bridge = FakeBridge::new(&["Kitchen"]);
        bridge.reachable = false;

        let report = run_one_cycle(&rainy(), &bridge, &AppConfig::default()).await;
        assert_eq!(report.analysis.condition, WeatherCondition::Rain);
        assert!(report.applied.is_empty());
    }

    #[tokio::test]
    async fn test_scheduler_runs_and_stops() {
        let bridge = FakeBridge::new(&["Kitchen"]);
        let mut config = AppConfig::default();
        config.schedule.initial_delay_seconds = 0;
        let forecast = rainy();
        let (tx, rx) = watch::channel(());

        let scheduler = run_scheduler(&forecast, &bridge, &config, rx);
        let stopper = async {
            for _ in 0..200 {
                if !bridge.applied().is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            tx.send(()).unwrap();
        };
        tokio::join!(scheduler, stopper);

        // First tick fires immediately; the next is an hour away.
        assert_eq!(bridge.applied().len(), 1);
    }

    #[tokio::test]
    async fn test_signal_error_keeps_scheduler_alive() {
        let (tx, mut rx) = watch::channel(());
        tokio::spawn(forward_shutdown(
            async { Err(std::io::Error::other("no signal handler")) },
            tx,
        ));

        // Neither a shutdown nor a closed channel.
        let waited = tokio::time::timeout(Duration::from_millis(50), rx.changed()).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_signal_triggers_shutdown() {
        let (tx, mut rx) = watch::channel(());
        tokio::spawn(forward_shutdown(async { Ok(()) }, tx));
        assert!(rx.changed().await.is_ok());
    }
}
