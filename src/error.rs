use thiserror::Error;

/// Failures inside the weather-to-light pipeline.
///
/// None of these escape the public engine functions: `classify`, `resolve`,
/// `map_condition_to_color` and `select` are total and degrade instead.
/// They surface from the provider adapters and the CLI commands.
#[derive(Debug, Error)]
pub enum MoodError {
    #[error("malformed forecast: {0}")]
    MalformedForecast(String),

    #[error("unresolvable color '{0}'")]
    UnresolvableColor(String),

    #[error("no target lights found for '{0}'")]
    NoTargetLights(String),

    #[error("failed to apply color to light '{light}': {reason}")]
    PerLightApplyFailure { light: String, reason: String },

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("bridge error {code}: {description}")]
    Bridge { code: i64, description: String },

    #[error("link button not pressed on the Hue bridge")]
    LinkButton,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MoodError>;
