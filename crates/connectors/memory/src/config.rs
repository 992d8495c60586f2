use serde::Deserialize;

/// Connector settings, supplied by whatever runtime hosts the connector.
///
/// The core never reads ambient state; the hosting entry point loads
/// these (typically from the function environment) and passes them in.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub catalog_name: String,
    pub spill_bucket: String,
    #[serde(default = "default_spill_prefix")]
    pub spill_prefix: String,
}

fn default_spill_prefix() -> String {
    "floe-spill".to_string()
}

impl Settings {
    /// Load settings from `FLOE_CONNECTOR__*` environment variables.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let s = config::Config::builder()
            .add_source(config::Environment::with_prefix("FLOE_CONNECTOR").separator("__"))
            .build()?;
        s.try_deserialize()
    }
}
