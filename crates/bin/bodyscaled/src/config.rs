//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `bodyscale.toml` in the working directory. Every field except
//! the scale address has a default, so the file is optional when
//! `BODYSCALE_DEVICE` is set. Environment variables take precedence over
//! file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use bodyscale_adapter_ble::BleConfig;
use bodyscale_app::config::PipelineConfig;
use bodyscale_domain::address::DeviceAddress;
use bodyscale_domain::attribution::AttributionConfig;
use bodyscale_domain::composition::BodyParameters;
use bodyscale_domain::dedup::DuplicateTolerance;
use bodyscale_domain::error::ScaleError;
use bodyscale_domain::profile::Sex;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scale: ScaleConfig,
    pub deduplication: DuplicateTolerance,
    pub attribution: AttributionConfig,
    /// Body used for readings no profile could be attributed to.
    pub fallback_profile: FallbackProfileConfig,
    pub database: DatabaseConfig,
    pub profiles: ProfilesConfig,
    pub logging: LoggingConfig,
    pub ble: BleConfig,
}

/// Monitored scale and polling cadence.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// `AA:BB:CC:DD:EE:FF` address of the scale. Required.
    pub device_address: Option<DeviceAddress>,
    pub scan_window_secs: u64,
    pub cycle_period_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FallbackProfileConfig {
    pub height_cm: f64,
    pub age_years: u32,
    pub sex: Sex,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Profile store location.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProfilesConfig {
    pub path: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `bodyscale.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// Pipeline bounds are checked by [`Config::pipeline_config`], which only
    /// the daemon needs; review commands run without a scale address.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed or an
    /// override cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("bodyscale.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(val) = var("BODYSCALE_DEVICE") {
            let address = val.parse::<DeviceAddress>().map_err(|_| {
                ConfigError::Validation(format!("BODYSCALE_DEVICE {val:?} is not a device address"))
            })?;
            self.scale.device_address = Some(address);
        }
        if let Some(val) = var("BODYSCALE_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("BODYSCALE_PROFILES") {
            self.profiles.path = PathBuf::from(val);
        }
        if let Some(val) = var("BODYSCALE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    /// Build the orchestrator settings from the loaded sections.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when no scale address is set and
    /// [`ConfigError::Pipeline`] when a value is outside its bounds.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let device = self.scale.device_address.ok_or_else(|| {
            ConfigError::Validation("scale.device_address must be set".to_string())
        })?;
        let config = PipelineConfig {
            device,
            scan_window: Duration::from_secs(self.scale.scan_window_secs),
            cycle_period: Duration::from_secs(self.scale.cycle_period_secs),
            tolerance: self.deduplication,
            attribution: self.attribution,
            fallback_body: BodyParameters {
                height_cm: self.fallback_profile.height_cm,
                age_years: self.fallback_profile.age_years,
                sex: self.fallback_profile.sex,
            },
        };
        config.validate().map_err(ConfigError::Pipeline)?;
        Ok(config)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            device_address: None,
            scan_window_secs: 20,
            cycle_period_secs: 10,
        }
    }
}

impl Default for FallbackProfileConfig {
    fn default() -> Self {
        Self {
            height_cm: 180.0,
            age_years: 30,
            sex: Sex::Male,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:bodyscale.db?mode=rwc".to_string(),
        }
    }
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("users.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "bodyscaled=info,bodyscale=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
    /// Pipeline settings outside their bounds.
    #[error("invalid pipeline configuration")]
    Pipeline(#[source] ScaleError),
}
