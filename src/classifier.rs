use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::WeatherConfig;
use crate::error::{MoodError, Result};
use crate::models::{HourlySample, WeatherAnalysis, WeatherCondition};

/// Temperature at or below which precipitation counts as snow.
const FREEZING_C: f64 = 0.0;
const SNOW_PRECIP_MM: f64 = 0.1;
const SNOW_PROBABILITY_PCT: i32 = 20;
const SHOWERS_PRECIP_MM: f64 = 2.0;
const SHOWERS_PROBABILITY_PCT: i32 = 70;
const SUNSHINE_TEMP_C: f64 = 25.0;
const MILD_TEMP_C: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub cold_c: f64,
    pub rain_probability_pct: i32,
    pub rain_amount_mm: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cold_c: 5.0,
            rain_probability_pct: 30,
            rain_amount_mm: 0.1,
        }
    }
}

impl From<&WeatherConfig> for Thresholds {
    fn from(cfg: &WeatherConfig) -> Self {
        Self {
            cold_c: cfg.cold_threshold,
            rain_probability_pct: cfg.rain_probability_threshold,
            rain_amount_mm: cfg.rain_amount_threshold,
        }
    }
}

impl Thresholds {
    fn is_wet(&self, precip_mm: f64, probability_pct: i32) -> bool {
        precip_mm > self.rain_amount_mm || probability_pct > self.rain_probability_pct
    }
}

/// Classifies a forecast sample set. Index 0 is the current hour.
///
/// Never fails: an empty sample set yields the `unknown` analysis.
pub fn classify(samples: &[HourlySample], thresholds: &Thresholds) -> WeatherAnalysis {
    match analyze(samples, thresholds) {
        Ok(analysis) => {
            log::info!("Weather analysis complete: {} (condition: {})", analysis.summary, analysis.condition);
            analysis
        }
        Err(e) => {
            log::error!("Weather analysis failed: {}", e);
            WeatherAnalysis::unknown(&e.to_string())
        }
    }
}

fn analyze(samples: &[HourlySample], thresholds: &Thresholds) -> Result<WeatherAnalysis> {
    let (now, later) = samples.split_first()
        .ok_or_else(|| MoodError::MalformedForecast("no hourly samples".to_string()))?;

    let current_temp = now.temperature_c;
    let current_precip = now.precipitation_mm;
    let current_prob = now.precipitation_probability_pct;

    let is_raining = thresholds.is_wet(current_precip, current_prob);

    let mut will_rain_soon = false;
    let mut max_precip_amount = current_precip;
    let mut max_precip_prob = current_prob;
    for sample in later {
        max_precip_amount = max_precip_amount.max(sample.precipitation_mm);
        max_precip_prob = max_precip_prob.max(sample.precipitation_probability_pct);
        if thresholds.is_wet(sample.precipitation_mm, sample.precipitation_probability_pct) {
            will_rain_soon = true;
        }
    }

    let is_very_cold = current_temp < thresholds.cold_c;
    let min_temp = later.iter().map(|s| s.temperature_c).fold(current_temp, f64::min);
    let will_be_very_cold = min_temp < thresholds.cold_c;

    let condition = condition_for(&Readings {
        current_temp,
        current_precip,
        current_prob,
        max_precip_amount,
        max_precip_prob,
        is_raining,
        is_very_cold,
    }, thresholds);

    let summary = summarize(is_raining, will_rain_soon, max_precip_prob, is_very_cold, will_be_very_cold, current_temp, min_temp);

    Ok(WeatherAnalysis {
        analysis_time: Utc::now(),
        condition,
        is_raining,
        will_rain_soon,
        is_very_cold,
        will_be_very_cold,
        max_precipitation_probability_pct: max_precip_prob,
        max_precipitation_amount_mm: max_precip_amount,
        current_temperature_c: current_temp,
        min_temperature_c: min_temp,
        summary,
    })
}

struct Readings {
    current_temp: f64,
    current_precip: f64,
    current_prob: i32,
    max_precip_amount: f64,
    max_precip_prob: i32,
    is_raining: bool,
    is_very_cold: bool,
}

// First matching rule wins. Keep the order.
fn condition_for(r: &Readings, t: &Thresholds) -> WeatherCondition {
    if r.current_temp <= FREEZING_C && (r.current_precip > SNOW_PRECIP_MM || r.current_prob > SNOW_PROBABILITY_PCT) {
        return WeatherCondition::Snow;
    }

    if r.is_raining || r.max_precip_amount > t.rain_amount_mm || r.max_precip_prob > t.rain_probability_pct {
        return if r.max_precip_amount > SHOWERS_PRECIP_MM || r.max_precip_prob > SHOWERS_PROBABILITY_PCT {
            WeatherCondition::Showers
        } else {
            WeatherCondition::Rain
        };
    }

    if r.is_very_cold {
        return WeatherCondition::Cold;
    }

    if r.current_temp > SUNSHINE_TEMP_C {
        WeatherCondition::Sunshine
    } else if r.current_temp > MILD_TEMP_C {
        if r.max_precip_prob > 10 && r.max_precip_prob < 30 {
            WeatherCondition::Overcast
        } else {
            WeatherCondition::Clear
        }
    } else if r.max_precip_prob > 20 {
        WeatherCondition::Overcast
    } else {
        WeatherCondition::Clear
    }
}

fn summarize(
    is_raining: bool,
    will_rain_soon: bool,
    max_precip_prob: i32,
    is_very_cold: bool,
    will_be_very_cold: bool,
    current_temp: f64,
    min_temp: f64,
) -> String {
    let mut summary = String::new();

    if is_raining {
        summary.push_str("Currently raining. ");
    } else if will_rain_soon {
        summary.push_str(&format!("Rain expected ({}% chance). ", max_precip_prob));
    } else {
        summary.push_str("No rain expected. ");
    }

    summary.push_str(&format!("Current temp: {:.1}°C. ", current_temp));

    if is_very_cold {
        summary.push_str("It's very cold! ");
    } else if will_be_very_cold {
        summary.push_str(&format!("It will be very cold (min: {:.1}°C). ", min_temp));
    }

    summary.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(temps: &[f64], precip: &[f64], probs: &[i32]) -> Vec<HourlySample> {
        temps.iter().zip(precip).zip(probs)
            .map(|((&t, &p), &prob)| HourlySample::new(t, p, prob))
            .collect()
    }

    fn condition(temps: &[f64], precip: &[f64], probs: &[i32]) -> WeatherCondition {
        classify(&samples(temps, precip, probs), &Thresholds::default()).condition
    }

    #[test]
    fn test_light_rain() {
        let a = classify(&samples(&[15.0, 14.0, 13.0], &[0.2, 0.3, 0.1], &[35, 40, 30]), &Thresholds::default());
        assert_eq!(a.condition, WeatherCondition::Rain);
        assert!(a.is_raining);
        assert!(a.will_rain_soon);
        assert_eq!(a.max_precipitation_probability_pct, 40);
        assert_eq!(a.max_precipitation_amount_mm, 0.3);
        assert_eq!(a.summary, "Currently raining. Current temp: 15.0°C.");
    }

    #[test]
    fn test_snow() {
        assert_eq!(condition(&[-2.0, -1.0, -3.0], &[0.5, 0.8, 0.3], &[45, 50, 40]), WeatherCondition::Snow);
        // Freezing boundary is inclusive, precipitation boundary is strict.
        assert_eq!(condition(&[0.0], &[0.0], &[21]), WeatherCondition::Snow);
        assert_eq!(condition(&[0.0], &[0.1], &[20]), WeatherCondition::Cold);
    }

    #[test]
    fn test_sunshine() {
        let a = classify(&samples(&[28.0, 30.0, 26.0], &[0.0, 0.0, 0.0], &[5, 3, 8]), &Thresholds::default());
        assert_eq!(a.condition, WeatherCondition::Sunshine);
        assert!(!a.is_raining);
        assert!(!a.will_rain_soon);
        assert_eq!(a.min_temperature_c, 26.0);
        assert_eq!(a.summary, "No rain expected. Current temp: 28.0°C.");
    }

    #[test]
    fn test_showers_on_heavy_amount_or_probability() {
        assert_eq!(condition(&[12.0, 12.0], &[0.5, 2.5], &[40, 40]), WeatherCondition::Showers);
        assert_eq!(condition(&[12.0, 12.0], &[0.0, 0.0], &[20, 71]), WeatherCondition::Showers);
        // 70% exactly is still rain.
        assert_eq!(condition(&[12.0, 12.0], &[0.0, 0.0], &[20, 70]), WeatherCondition::Rain);
        assert_eq!(condition(&[12.0, 12.0], &[0.0, 2.0], &[0, 0]), WeatherCondition::Rain);
    }

    #[test]
    fn test_rain_expected_later() {
        let a = classify(&samples(&[18.0, 17.0, 16.0], &[0.0, 0.0, 0.0], &[10, 20, 45]), &Thresholds::default());
        assert_eq!(a.condition, WeatherCondition::Rain);
        assert!(!a.is_raining);
        assert!(a.will_rain_soon);
        assert_eq!(a.summary, "Rain expected (45% chance). Current temp: 18.0°C.");
    }

    #[test]
    fn test_rain_precedes_cold() {
        assert_eq!(condition(&[2.0, 1.0], &[0.5, 0.5], &[10, 10]), WeatherCondition::Rain);
    }

    #[test]
    fn test_cold_and_dry() {
        let a = classify(&samples(&[3.0, 2.0], &[0.0, 0.0], &[0, 0]), &Thresholds::default());
        assert_eq!(a.condition, WeatherCondition::Cold);
        assert!(a.is_very_cold);
        assert!(a.will_be_very_cold);
        assert_eq!(a.summary, "No rain expected. Current temp: 3.0°C. It's very cold!");
    }

    #[test]
    fn test_will_be_cold() {
        let a = classify(&samples(&[8.0, 4.5], &[0.0, 0.0], &[0, 0]), &Thresholds::default());
        assert_eq!(a.condition, WeatherCondition::Clear);
        assert!(!a.is_very_cold);
        assert!(a.will_be_very_cold);
        assert_eq!(a.summary, "No rain expected. Current temp: 8.0°C. It will be very cold (min: 4.5°C).");
    }

    #[test]
    fn test_cold_threshold_is_strict() {
        let a = classify(&samples(&[5.0, 5.0], &[0.0, 0.0], &[0, 0]), &Thresholds::default());
        assert_eq!(a.condition, WeatherCondition::Clear);
        assert!(!a.is_very_cold);
        assert!(!a.will_be_very_cold);
        assert_eq!(a.min_temperature_c, 5.0);
    }

    #[test]
    fn test_will_rain_soon_ignores_current_hour() {
        let a = classify(&samples(&[12.0, 12.0], &[0.5, 0.0], &[40, 0]), &Thresholds::default());
        assert_eq!(a.condition, WeatherCondition::Rain);
        assert!(a.is_raining);
        assert!(!a.will_rain_soon);
    }

    #[test]
    fn test_mild_band() {
        // 15 < t <= 25: overcast only for 10 < p < 30
        assert_eq!(condition(&[25.0], &[0.0], &[11]), WeatherCondition::Overcast);
        assert_eq!(condition(&[20.0], &[0.0], &[29]), WeatherCondition::Overcast);
        assert_eq!(condition(&[20.0], &[0.0], &[10]), WeatherCondition::Clear);
        assert_eq!(condition(&[20.0], &[0.0], &[30]), WeatherCondition::Clear);
        assert_eq!(condition(&[25.1], &[0.0], &[20]), WeatherCondition::Sunshine);
    }

    #[test]
    fn test_cool_band() {
        assert_eq!(condition(&[15.0], &[0.0], &[21]), WeatherCondition::Overcast);
        assert_eq!(condition(&[15.0], &[0.0], &[20]), WeatherCondition::Clear);
        assert_eq!(condition(&[6.0], &[0.0], &[30]), WeatherCondition::Overcast);
    }

    #[test]
    fn test_custom_thresholds() {
        let t = Thresholds { cold_c: 10.0, rain_probability_pct: 50, rain_amount_mm: 1.0 };
        let a = classify(&samples(&[8.0, 9.0], &[0.5, 0.9], &[40, 45]), &t);
        assert_eq!(a.condition, WeatherCondition::Cold);
        assert!(!a.is_raining);
        assert!(!a.will_rain_soon);
    }

    #[test]
    fn test_empty_is_unknown() {
        let a = classify(&[], &Thresholds::default());
        assert_eq!(a.condition, WeatherCondition::Unknown);
        assert!(a.summary.starts_with("Error: "));
    }

    #[test]
    fn test_condition_always_in_enum() {
        for t in [-10.0, 0.0, 4.9, 5.0, 15.0, 15.5, 25.0, 30.0] {
            for p in [0.0, 0.1, 0.11, 2.0, 3.0] {
                for prob in [0, 10, 11, 20, 21, 29, 30, 31, 70, 71, 100] {
                    let c = condition(&[t, t], &[p, p], &[prob, prob]);
                    assert!(WeatherCondition::ALL.contains(&c));
                    assert_ne!(c, WeatherCondition::Unknown);
                }
            }
        }
    }
}
