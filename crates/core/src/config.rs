use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `FIDELITY_DESK__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub desk: DeskConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeskConfig {
    /// Directory scenario and rule JSON files are read from.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub log_json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Applied when a rule record omits `validity_days`.
    #[serde(default = "default_validity_days")]
    pub default_validity_days: u32,
}

fn default_data_dir() -> String {
    ".".to_string()
}
fn default_validity_days() -> u32 {
    crate::rules::DEFAULT_VALIDITY_DAYS
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_json: false,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_validity_days: default_validity_days(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            desk: DeskConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional
    /// config file.
    pub fn load(file: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::with_name(path));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("FIDELITY_DESK")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
