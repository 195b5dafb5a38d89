use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub watch: WatchConfig,
    #[serde(default)]
    pub race: RaceConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_ws: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Canonical signature of the call to race, e.g. "mint()".
    pub target_signature: String,
    #[serde(default = "default_tx_fetch_timeout_ms")]
    pub tx_fetch_timeout_ms: u64,
    #[serde(default = "default_feed_channel_size")]
    pub feed_channel_size: usize,
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
    #[serde(default = "default_dedup_ttl_ms")]
    pub dedup_ttl_ms: u64,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Name of the environment variable holding the signing key. The key
    /// itself never appears in config or logs.
    #[serde(default = "default_signer_private_key_env")]
    pub signer_private_key_env: String,
    #[serde(default = "default_fee_bump_pct")]
    pub priority_fee_bump_pct: u32,
    #[serde(default = "default_fee_bump_pct")]
    pub fee_cap_bump_pct: u32,
    #[serde(default = "default_gas_limit_bump_pct")]
    pub gas_limit_bump_pct: u32,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub metrics_enabled: bool,
    #[serde(default = "default_metrics_bind")]
    pub metrics_bind: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("FORERUN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let cfg: Self = cfg.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Misconfiguration is fatal at startup; nothing else terminates the
    /// process once the watch loop is running.
    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_ws.trim().is_empty() {
            return Err(Error::Invalid("chain.rpc_ws must be set".into()));
        }
        if self.watch.target_signature.trim().is_empty() {
            return Err(Error::Invalid("watch.target_signature must be set".into()));
        }
        if self.race.priority_fee_bump_pct <= 100 {
            return Err(Error::Invalid(
                "race.priority_fee_bump_pct must be > 100".into(),
            ));
        }
        if self.race.fee_cap_bump_pct <= 100 {
            return Err(Error::Invalid("race.fee_cap_bump_pct must be > 100".into()));
        }
        if self.race.gas_limit_bump_pct < 100 {
            return Err(Error::Invalid(
                "race.gas_limit_bump_pct must be >= 100".into(),
            ));
        }
        if self.watch.reconnect_delay_secs == 0 {
            return Err(Error::Invalid(
                "watch.reconnect_delay_secs must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            signer_private_key_env: default_signer_private_key_env(),
            priority_fee_bump_pct: default_fee_bump_pct(),
            fee_cap_bump_pct: default_fee_bump_pct(),
            gas_limit_bump_pct: default_gas_limit_bump_pct(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_bind: default_metrics_bind(),
            log_level: default_log_level(),
        }
    }
}

fn default_signer_private_key_env() -> String {
    "FORERUN_PRIVATE_KEY".to_string()
}

fn default_fee_bump_pct() -> u32 {
    120
}

fn default_gas_limit_bump_pct() -> u32 {
    200
}

fn default_tx_fetch_timeout_ms() -> u64 {
    2_000
}

fn default_feed_channel_size() -> usize {
    4_096
}

fn default_dedup_capacity() -> usize {
    100_000
}

fn default_dedup_ttl_ms() -> u64 {
    60_000
}

fn default_reconnect_delay_secs() -> u64 {
    3
}

fn default_receipt_poll_interval_ms() -> u64 {
    2_000
}

fn default_receipt_timeout_ms() -> u64 {
    120_000
}

fn default_metrics_bind() -> String {
    "127.0.0.1:9464".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::AppConfig;

    fn parse(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const MINIMAL: &str = r#"
        [chain]
        rpc_ws = "ws://127.0.0.1:8545"

        [watch]
        target_signature = "mint()"
    "#;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = parse(MINIMAL);
        cfg.validate().unwrap();
        assert_eq!(cfg.race.priority_fee_bump_pct, 120);
        assert_eq!(cfg.race.fee_cap_bump_pct, 120);
        assert_eq!(cfg.race.gas_limit_bump_pct, 200);
        assert_eq!(cfg.watch.reconnect_delay_secs, 3);
        assert_eq!(cfg.race.signer_private_key_env, "FORERUN_PRIVATE_KEY");
        assert!(!cfg.observability.metrics_enabled);
    }

    #[test]
    fn fee_bump_at_or_below_100_is_rejected() {
        let mut cfg = parse(MINIMAL);
        cfg.race.priority_fee_bump_pct = 100;
        assert!(cfg.validate().is_err());

        let mut cfg = parse(MINIMAL);
        cfg.race.fee_cap_bump_pct = 90;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn gas_bump_of_exactly_100_is_allowed() {
        let mut cfg = parse(MINIMAL);
        cfg.race.gas_limit_bump_pct = 100;
        cfg.validate().unwrap();
    }

    #[test]
    fn empty_signature_is_rejected() {
        let mut cfg = parse(MINIMAL);
        cfg.watch.target_signature = "  ".to_string();
        assert!(cfg.validate().is_err());
    }
}
