//! Round configuration, fixed at creation.
//!
//! # Configuration Sources
//!
//! Configuration can come from:
//! - Environment variables (prefixed with `FAIRDRAW_`)
//! - Programmatic defaults via the builder
//!
//! # Example
//!
//! ```rust,ignore
//! use fairdraw_core::config::RoundConfig;
//!
//! let config = RoundConfig::builder()
//!     .entrance_fee(100)
//!     .interval_ms(30_000)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::{Amount, DrawError, Result};

/// Complete configuration for one draw instance. Immutable after creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Fee each entry must meet or exceed, in the smallest unit.
    pub entrance_fee: Amount,

    /// Minimum time between completed draws, in milliseconds.
    pub interval_ms: i64,

    /// Parameters forwarded opaquely to the randomness oracle.
    pub oracle: OracleParams,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            entrance_fee: 100,
            interval_ms: 30_000,
            oracle: OracleParams::default(),
        }
    }
}

impl RoundConfig {
    /// Create a new configuration builder.
    pub fn builder() -> RoundConfigBuilder {
        RoundConfigBuilder::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Looks for variables prefixed with `FAIRDRAW_`:
    /// - `FAIRDRAW_ENTRANCE_FEE` - entry fee in the smallest unit
    /// - `FAIRDRAW_INTERVAL_MS` - draw interval in milliseconds
    /// - `FAIRDRAW_GAS_LANE_HEX` - oracle gas lane (64 hex characters)
    /// - `FAIRDRAW_SUBSCRIPTION_ID` - oracle billing subscription
    /// - `FAIRDRAW_CALLBACK_GAS_LIMIT` - gas ceiling for the oracle callback
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(fee) = std::env::var("FAIRDRAW_ENTRANCE_FEE") {
            config.entrance_fee = fee.parse().map_err(|e| {
                DrawError::ConfigError(format!("Invalid FAIRDRAW_ENTRANCE_FEE: {}", e))
            })?;
        }

        if let Ok(interval) = std::env::var("FAIRDRAW_INTERVAL_MS") {
            config.interval_ms = interval.parse().map_err(|e| {
                DrawError::ConfigError(format!("Invalid FAIRDRAW_INTERVAL_MS: {}", e))
            })?;
        }

        if let Ok(lane) = std::env::var("FAIRDRAW_GAS_LANE_HEX") {
            config.oracle.gas_lane_hex = Some(lane);
        }

        if let Ok(sub) = std::env::var("FAIRDRAW_SUBSCRIPTION_ID") {
            config.oracle.subscription_id = sub.parse().map_err(|e| {
                DrawError::ConfigError(format!("Invalid FAIRDRAW_SUBSCRIPTION_ID: {}", e))
            })?;
        }

        if let Ok(limit) = std::env::var("FAIRDRAW_CALLBACK_GAS_LIMIT") {
            config.oracle.callback_gas_limit = limit.parse().map_err(|e| {
                DrawError::ConfigError(format!("Invalid FAIRDRAW_CALLBACK_GAS_LIMIT: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.entrance_fee == 0 {
            return Err(DrawError::ConfigError(
                "entrance_fee must be positive".into(),
            ));
        }

        if self.interval_ms <= 0 {
            return Err(DrawError::ConfigError("interval_ms must be positive".into()));
        }

        self.oracle.validate()
    }
}

/// Oracle request parameters, opaque to the core.
///
/// Field meanings follow the consuming oracle's conventions; the core only
/// carries them to `RandomnessSource::request`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OracleParams {
    /// Hex-encoded 32-byte gas lane / key hash the oracle should use.
    pub gas_lane_hex: Option<String>,

    /// Billing subscription funding the request.
    pub subscription_id: u64,

    /// Gas ceiling the oracle may spend delivering the response.
    pub callback_gas_limit: u32,

    /// Confirmations the oracle waits before responding.
    pub request_confirmations: u16,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            gas_lane_hex: None,
            subscription_id: 0,
            callback_gas_limit: 500_000,
            request_confirmations: 3,
        }
    }
}

impl OracleParams {
    pub fn validate(&self) -> Result<()> {
        if let Some(ref lane) = self.gas_lane_hex {
            if lane.len() != 64 {
                return Err(DrawError::ConfigError(
                    "gas_lane_hex must be 64 hex characters (32 bytes)".into(),
                ));
            }
            if hex::decode(lane).is_err() {
                return Err(DrawError::ConfigError("gas_lane_hex is not valid hex".into()));
            }
        }

        Ok(())
    }
}

/// Builder for RoundConfig.
#[derive(Default)]
pub struct RoundConfigBuilder {
    config: RoundConfig,
}

impl RoundConfigBuilder {
    /// Set the entrance fee.
    pub fn entrance_fee(mut self, fee: Amount) -> Self {
        self.config.entrance_fee = fee;
        self
    }

    /// Set the draw interval in milliseconds.
    pub fn interval_ms(mut self, interval_ms: i64) -> Self {
        self.config.interval_ms = interval_ms;
        self
    }

    /// Set the oracle gas lane from hex.
    pub fn gas_lane_hex(mut self, lane: impl Into<String>) -> Self {
        self.config.oracle.gas_lane_hex = Some(lane.into());
        self
    }

    /// Set the oracle billing subscription.
    pub fn subscription_id(mut self, id: u64) -> Self {
        self.config.oracle.subscription_id = id;
        self
    }

    /// Set the oracle callback gas ceiling.
    pub fn callback_gas_limit(mut self, limit: u32) -> Self {
        self.config.oracle.callback_gas_limit = limit;
        self
    }

    /// Set how many confirmations the oracle waits before responding.
    pub fn request_confirmations(mut self, confirmations: u16) -> Self {
        self.config.oracle.request_confirmations = confirmations;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<RoundConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RoundConfig::default();
        config.validate().expect("default config is valid");
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = RoundConfig::builder()
            .entrance_fee(1)
            .interval_ms(100)
            .subscription_id(77)
            .build()
            .unwrap();

        assert_eq!(config.entrance_fee, 1);
        assert_eq!(config.interval_ms, 100);
        assert_eq!(config.oracle.subscription_id, 77);
        assert_eq!(config.oracle.callback_gas_limit, 500_000);
    }

    #[test]
    fn rejects_zero_fee() {
        let result = RoundConfig::builder().entrance_fee(0).build();
        assert!(matches!(result, Err(DrawError::ConfigError(_))));
    }

    #[test]
    fn rejects_nonpositive_interval() {
        let result = RoundConfig::builder().interval_ms(0).build();
        assert!(matches!(result, Err(DrawError::ConfigError(_))));

        let result = RoundConfig::builder().interval_ms(-5).build();
        assert!(matches!(result, Err(DrawError::ConfigError(_))));
    }

    #[test]
    fn rejects_malformed_gas_lane() {
        let result = RoundConfig::builder().gas_lane_hex("abc").build();
        assert!(matches!(result, Err(DrawError::ConfigError(_))));

        let result = RoundConfig::builder().gas_lane_hex("zz".repeat(32)).build();
        assert!(matches!(result, Err(DrawError::ConfigError(_))));

        let result = RoundConfig::builder().gas_lane_hex("ab".repeat(32)).build();
        assert!(result.is_ok());
    }
}
