//! Configuration management for DealScout
//!
//! Loads from config files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Main engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    pub anomaly: AnomalyConfig,
    pub forecast: ForecastConfig,
    pub ranking: RankingConfig,
}

impl EngineConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Anomaly defaults
            .set_default("anomaly.z_score_threshold", 2.5)?
            .set_default("anomaly.anomaly_threshold", 0.85)?
            .set_default("anomaly.deviation_floor", 0.40)?
            .set_default("anomaly.weights.z_score", 0.30)?
            .set_default("anomaly.weights.iqr", 0.20)?
            .set_default("anomaly.weights.historical", 0.20)?
            .set_default("anomaly.weights.discount", 0.15)?
            .set_default("anomaly.weights.pattern", 0.15)?
            // Forecast defaults
            .set_default("forecast.num_paths", 10_000)?
            .set_default("forecast.default_horizon_days", 90)?
            .set_default("forecast.max_horizon_days", 365)?
            .set_default("forecast.book_now_threshold", 0.6)?
            .set_default("forecast.wait_threshold", 0.6)?
            // Ranking defaults
            .set_default("ranking.weights.anomaly", 0.40)?
            .set_default("ranking.weights.exclusivity", 0.25)?
            .set_default("ranking.weights.historical_value", 0.15)?
            .set_default("ranking.weights.quality_value", 0.10)?
            .set_default("ranking.weights.cancellation_flexibility", 0.05)?
            .set_default("ranking.weights.availability_urgency", 0.05)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (DEALSCOUT_*)
            .add_source(Environment::with_prefix("DEALSCOUT").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let engine_config: EngineConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        engine_config.validate()?;

        Ok(engine_config)
    }

    /// Reject weight tables that do not sum to 1.0
    pub fn validate(&self) -> Result<()> {
        let method_sum = self.anomaly.weights.sum();
        if (method_sum - 1.0).abs() > 1e-6 {
            bail!("anomaly method weights must sum to 1.0, got {method_sum}");
        }
        let rank_sum = self.ranking.weights.sum();
        if (rank_sum - 1.0).abs() > 1e-6 {
            bail!("ranking weights must sum to 1.0, got {rank_sum}");
        }
        Ok(())
    }

    /// Generate a digest of the config for startup logging
    pub fn digest(&self) -> String {
        format!(
            "anomaly_threshold={:.2} z_threshold={:.1} paths={} horizon={}d",
            self.anomaly.anomaly_threshold,
            self.anomaly.z_score_threshold,
            self.forecast.num_paths,
            self.forecast.default_horizon_days
        )
    }
}

impl std::fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_lopsided_weights_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.ranking.weights.anomaly = 0.9;
        assert!(cfg.validate().is_err());
    }
}
