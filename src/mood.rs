use std::collections::HashMap;

use crate::config::ColorMappingConfig;
use crate::models::WeatherAnalysis;

const LEGACY_RAIN: &str = "rain blue";
const LEGACY_COLD: &str = "dark orange";
const LEGACY_NORMAL: &str = "white";

/// How a weather analysis becomes a color spec for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorStrategy {
    /// Condition lookup, with a default for unmapped conditions.
    Mapped {
        conditions: HashMap<String, String>,
        default_color: String,
    },
    /// Rain blue when raining, dark orange when very cold, otherwise white.
    ///
    /// Looks only at the `is_raining` and `is_very_cold` flags, so it can
    /// disagree with the discrete condition (e.g. showers expected later but
    /// dry right now gives white).
    Legacy,
}

impl ColorStrategy {
    /// Mapping disabled or an empty table both select the legacy rule.
    pub fn from_config(config: &ColorMappingConfig) -> Self {
        if !config.enabled || config.conditions.is_empty() {
            return ColorStrategy::Legacy;
        }

        ColorStrategy::Mapped {
            conditions: config.conditions.iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v.clone()))
                .collect(),
            default_color: config.default_color.clone(),
        }
    }

    pub fn color_for(&self, analysis: &WeatherAnalysis) -> String {
        match self {
            ColorStrategy::Mapped { conditions, default_color } => {
                let condition = analysis.condition.as_str();
                match conditions.get(condition) {
                    Some(color) => {
                        log::debug!("Using mapped color '{}' for condition '{}'", color, condition);
                        color.clone()
                    }
                    None => {
                        log::debug!("No mapping found for condition '{}', using default color '{}'", condition, default_color);
                        default_color.clone()
                    }
                }
            }
            ColorStrategy::Legacy => {
                log::debug!("Using legacy color logic for weather condition '{}'", analysis.condition);
                legacy_color(analysis).to_string()
            }
        }
    }
}

fn legacy_color(analysis: &WeatherAnalysis) -> &'static str {
    if analysis.is_raining {
        LEGACY_RAIN
    } else if analysis.is_very_cold {
        LEGACY_COLD
    } else {
        LEGACY_NORMAL
    }
}

/// Picks the color spec for an analysis under the given mapping config.
pub fn map_condition_to_color(analysis: &WeatherAnalysis, config: &ColorMappingConfig) -> String {
    ColorStrategy::from_config(config).color_for(analysis)
}
