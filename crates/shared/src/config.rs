//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;
use crate::types::{Precision, RoundingMode};

/// Largest supported number of decimal places for the minor unit.
pub const MAX_DECIMAL_PLACES: u32 = 12;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Settlement engine configuration.
    #[serde(default)]
    pub settlement: SettlementConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settlement engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    /// Decimal places of the minor currency unit.
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
    /// Rounding applied when snapping amounts to the minor unit.
    #[serde(default)]
    pub rounding: RoundingMode,
    /// How far (in minor units) a balance map may drift from zero before
    /// the optimizer refuses it.
    #[serde(default = "default_zero_sum_tolerance_units")]
    pub zero_sum_tolerance_units: u32,
}

fn default_decimal_places() -> u32 {
    2
}

fn default_zero_sum_tolerance_units() -> u32 {
    1
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            decimal_places: default_decimal_places(),
            rounding: RoundingMode::default(),
            zero_sum_tolerance_units: default_zero_sum_tolerance_units(),
        }
    }
}

impl SettlementConfig {
    /// Precision derived from this configuration.
    #[must_use]
    pub const fn precision(&self) -> Precision {
        Precision::new(self.decimal_places, self.rounding)
    }

    /// Zero-sum tolerance as an amount, e.g. `0.01` for one cent.
    #[must_use]
    pub fn tolerance(&self) -> Decimal {
        self.precision().unit() * Decimal::from(self.zero_sum_tolerance_units)
    }

    /// Checks that the configured values are usable.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.decimal_places > MAX_DECIMAL_PLACES {
            return Err(AppError::Config(format!(
                "settlement.decimal_places must be at most {MAX_DECIMAL_PLACES}, got {}",
                self.decimal_places
            )));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "cartsplit=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `CARTSPLIT__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, AppError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("CARTSPLIT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.settlement.validate()?;
        Ok(app)
    }
}
