use crate::config::HueConfig;
use crate::models::Light;

/// Which lights a cycle should update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LightTargetConfig {
    pub target_all_lights: bool,
    pub target_light_name: Option<String>,
}

impl From<&HueConfig> for LightTargetConfig {
    fn from(cfg: &HueConfig) -> Self {
        Self {
            target_all_lights: cfg.target_all_lights,
            target_light_name: cfg.target_light_name.clone(),
        }
    }
}

impl LightTargetConfig {
    /// The trimmed target name, if one is set and specific lights are targeted.
    fn specific_name(&self) -> Option<&str> {
        if self.target_all_lights {
            return None;
        }
        self.target_light_name.as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Narrows `lights` to those the config targets. An empty result is logged, not an error.
pub fn select(lights: &[Light], config: &LightTargetConfig) -> Vec<Light> {
    if lights.is_empty() {
        return Vec::new();
    }

    let Some(target) = config.specific_name() else {
        log::debug!("Targeting all {} lights", lights.len());
        return lights.to_vec();
    };

    let selected: Vec<Light> = lights.iter()
        .filter(|light| light.name.to_lowercase() == target.to_lowercase())
        .cloned()
        .collect();

    if selected.is_empty() {
        let available: Vec<&str> = lights.iter().map(|l| l.name.as_str()).collect();
        log::warn!("Target light '{}' not found. Available lights: {:?}", target, available);
    } else {
        log::debug!("Found target light: '{}'", target);
    }

    selected
}
