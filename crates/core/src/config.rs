use ::config::{Config, Environment, File};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::domain::{chain_label, Domain};
use crate::{Error, Result};

/// Gas allowance passed to the asset finalize transaction
pub const DEFAULT_ASSET_FINALIZE_GAS_LIMIT: u64 = 4_700_000;

/// Environment variable prefix, e.g. `BRIDGE_L1__RPC_URL`
pub const ENV_PREFIX: &str = "BRIDGE";

/// Connection settings for one side of the bridge
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainConfig {
    #[serde(default)]
    pub chain_id: u64,

    #[serde(default)]
    pub rpc_url: String,
}

impl DomainConfig {
    pub fn new(chain_id: u64, rpc_url: impl Into<String>) -> Self {
        Self {
            chain_id,
            rpc_url: rpc_url.into(),
        }
    }

    fn validate(&self, domain: Domain) -> Result<()> {
        if self.chain_id == 0 {
            return Err(Error::ConfigError(format!("{} chain_id is required", domain)));
        }

        if self.rpc_url.trim().is_empty() {
            return Err(Error::ConfigError(format!("{} rpc_url is required", domain)));
        }

        // signing clients are built over HTTP only
        let scheme_ok = ["http://", "https://"]
            .iter()
            .any(|scheme| self.rpc_url.starts_with(scheme));
        if !scheme_ok {
            return Err(Error::ConfigError(format!(
                "{} rpc_url '{}' must be an http(s) URL",
                domain, self.rpc_url
            )));
        }

        Ok(())
    }
}

/// Bridged native token contracts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeTokenConfig {
    pub l1_address: Address,
    pub l2_address: Address,

    #[serde(default = "default_symbol")]
    pub symbol: String,
}

fn default_symbol() -> String {
    "MNT".to_string()
}

fn default_asset_finalize_gas_limit() -> u64 {
    DEFAULT_ASSET_FINALIZE_GAS_LIMIT
}

/// Per-orchestrator bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub l1: DomainConfig,

    #[serde(default)]
    pub l2: DomainConfig,

    /// Required only for native deposits and withdrawals
    #[serde(default)]
    pub native_token: Option<NativeTokenConfig>,

    #[serde(default = "default_asset_finalize_gas_limit")]
    pub asset_finalize_gas_limit: u64,
}

impl BridgeConfig {
    pub fn new(l1: DomainConfig, l2: DomainConfig) -> Self {
        Self {
            l1,
            l2,
            native_token: None,
            asset_finalize_gas_limit: DEFAULT_ASSET_FINALIZE_GAS_LIMIT,
        }
    }

    pub fn with_native_token(mut self, token: NativeTokenConfig) -> Self {
        self.native_token = Some(token);
        self
    }

    /// Loads `.env`, an optional config file, then `BRIDGE_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Ok(env_file) = dotenv::dotenv() {
            debug!("Loaded environment from {}", env_file.display());
        }

        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Self::from_config(config)
    }

    /// Deserializes and validates an already-assembled configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let parsed: BridgeConfig = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Checks every required field; nothing is submitted with a bad config
    pub fn validate(&self) -> Result<()> {
        self.l1.validate(Domain::L1)?;
        self.l2.validate(Domain::L2)?;

        if self.l1.chain_id == self.l2.chain_id {
            return Err(Error::ConfigError(format!(
                "L1 and L2 must be different chains, both are {}",
                chain_label(self.l1.chain_id)
            )));
        }

        if let Some(token) = &self.native_token {
            if token.l1_address.is_zero() || token.l2_address.is_zero() {
                return Err(Error::ConfigError("native token addresses must be non-zero".to_string()));
            }
        }

        if self.asset_finalize_gas_limit == 0 {
            return Err(Error::ConfigError("asset_finalize_gas_limit must be positive".to_string()));
        }

        Ok(())
    }

    /// Native token contracts, required by native transfers
    pub fn native_token(&self) -> Result<&NativeTokenConfig> {
        self.native_token
            .as_ref()
            .ok_or_else(|| Error::ConfigError("native_token addresses are required for native transfers".to_string()))
    }

    pub fn domain(&self, domain: Domain) -> &DomainConfig {
        match domain {
            Domain::L1 => &self.l1,
            Domain::L2 => &self.l2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::config::FileFormat;
    use std::sync::{Mutex, MutexGuard};

    // process environment is shared by every test thread
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Sets `BRIDGE_*` variables for one test and clears them on drop
    struct ScopedEnv {
        keys: Vec<&'static str>,
        _lock: MutexGuard<'static, ()>,
    }

    impl ScopedEnv {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            for (key, value) in vars {
                std::env::set_var(key, value);
            }
            Self {
                keys: vars.iter().map(|(key, _)| *key).collect(),
                _lock: lock,
            }
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            for key in &self.keys {
                std::env::remove_var(key);
            }
        }
    }

    const SEPOLIA_TOML: &str = r#"
        [l1]
        chain_id = 11155111
        rpc_url = "https://rpc.sepolia.org"

        [l2]
        chain_id = 5003
        rpc_url = "https://rpc.sepolia.mantle.xyz"

        [native_token]
        l1_address = "0x65e37B558F64E2Be5768DB46DF22F93d85741A9E"
        l2_address = "0xDeadDeAddeAddEAddeadDEaDDEAdDeaDDeAD0000"
        symbol = "tMNT"
    "#;

    fn from_toml(text: &str) -> Result<BridgeConfig> {
        let config = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;
        BridgeConfig::from_config(config)
    }

    #[test]
    fn test_full_config_from_toml() {
        let config = from_toml(
            r#"
            [l1]
            chain_id = 11155111
            rpc_url = "https://rpc.sepolia.org"

            [l2]
            chain_id = 5003
            rpc_url = "https://rpc.sepolia.mantle.xyz"

            [native_token]
            l1_address = "0x65e37B558F64E2Be5768DB46DF22F93d85741A9E"
            l2_address = "0xDeadDeAddeAddEAddeadDEaDDEAdDeaDDeAD0000"
            "#,
        )
        .unwrap();

        assert_eq!(config.l1.chain_id, 11155111);
        assert_eq!(config.domain(Domain::L2).rpc_url, "https://rpc.sepolia.mantle.xyz");
        assert_eq!(config.native_token().unwrap().symbol, "MNT");
        assert_eq!(config.asset_finalize_gas_limit, DEFAULT_ASSET_FINALIZE_GAS_LIMIT);
    }

    #[test]
    fn test_missing_domain_is_config_error() {
        let err = from_toml(
            r#"
            [l1]
            chain_id = 1
            rpc_url = "https://eth.llamarpc.com"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("L2 chain_id")));
    }

    #[test]
    fn test_missing_rpc_url_is_config_error() {
        let config = BridgeConfig::new(
            DomainConfig::new(1, ""),
            DomainConfig::new(5000, "https://rpc.mantle.xyz"),
        );
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("L1 rpc_url")));
    }

    #[test]
    fn test_rejects_bad_scheme_and_same_chain() {
        let config = BridgeConfig::new(
            DomainConfig::new(1, "localhost:8545"),
            DomainConfig::new(5000, "https://rpc.mantle.xyz"),
        );
        assert!(config.validate().is_err());

        let config = BridgeConfig::new(
            DomainConfig::new(5000, "https://a.example"),
            DomainConfig::new(5000, "https://b.example"),
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Mantle"));
    }

    #[test]
    fn test_rejects_websocket_rpc_url() {
        let config = BridgeConfig::new(
            DomainConfig::new(1, "https://eth.llamarpc.com"),
            DomainConfig::new(5000, "wss://rpc.mantle.xyz"),
        );
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("L2 rpc_url")));
    }

    #[test]
    fn test_native_token_required_for_native_transfers() {
        let config = BridgeConfig::new(
            DomainConfig::new(1, "https://eth.llamarpc.com"),
            DomainConfig::new(5000, "https://rpc.mantle.xyz"),
        );
        assert!(config.validate().is_ok());
        assert!(matches!(config.native_token(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_malformed_address_is_config_error() {
        let err = from_toml(
            r#"
            [l1]
            chain_id = 1
            rpc_url = "https://eth.llamarpc.com"

            [l2]
            chain_id = 5000
            rpc_url = "https://rpc.mantle.xyz"

            [native_token]
            l1_address = "not-an-address"
            l2_address = "0xDeadDeAddeAddEAddeadDEaDDEAdDeaDDeAD0000"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_load_from_environment() {
        let _env = ScopedEnv::set(&[
            ("BRIDGE_L1__CHAIN_ID", "11155111"),
            ("BRIDGE_L1__RPC_URL", "https://rpc.sepolia.org"),
            ("BRIDGE_L2__CHAIN_ID", "5003"),
            ("BRIDGE_L2__RPC_URL", "https://rpc.sepolia.mantle.xyz"),
            ("BRIDGE_NATIVE_TOKEN__L1_ADDRESS", "0x65e37B558F64E2Be5768DB46DF22F93d85741A9E"),
            ("BRIDGE_NATIVE_TOKEN__L2_ADDRESS", "0xDeadDeAddeAddEAddeadDEaDDEAdDeaDDeAD0000"),
        ]);

        let config = BridgeConfig::load(None).unwrap();
        assert_eq!(config.l1.chain_id, 11155111);
        assert_eq!(config.l2.chain_id, 5003);
        assert_eq!(config.l2.rpc_url, "https://rpc.sepolia.mantle.xyz");

        let token = config.native_token().unwrap();
        let expected: Address = "0x65e37B558F64E2Be5768DB46DF22F93d85741A9E".parse().unwrap();
        assert_eq!(token.l1_address, expected);
        assert_eq!(token.symbol, "MNT");
        assert_eq!(config.asset_finalize_gas_limit, DEFAULT_ASSET_FINALIZE_GAS_LIMIT);
    }

    #[test]
    fn test_load_from_file() {
        let _env = ScopedEnv::set(&[]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, SEPOLIA_TOML).unwrap();

        let config = BridgeConfig::load(Some(&path)).unwrap();
        assert_eq!(config.l1.rpc_url, "https://rpc.sepolia.org");
        assert_eq!(config.l2.chain_id, 5003);
        assert_eq!(config.native_token().unwrap().symbol, "tMNT");
    }

    #[test]
    fn test_environment_overrides_file() {
        let _env = ScopedEnv::set(&[
            ("BRIDGE_L2__RPC_URL", "https://mantle-sepolia.example"),
            ("BRIDGE_ASSET_FINALIZE_GAS_LIMIT", "5000000"),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bridge.toml");
        std::fs::write(&path, SEPOLIA_TOML).unwrap();

        let config = BridgeConfig::load(Some(&path)).unwrap();
        assert_eq!(config.l1.rpc_url, "https://rpc.sepolia.org");
        assert_eq!(config.l2.rpc_url, "https://mantle-sepolia.example");
        assert_eq!(config.asset_finalize_gas_limit, 5_000_000);
    }

    #[test]
    fn test_load_rejects_unprefixed_variables() {
        let _env = ScopedEnv::set(&[("L1__CHAIN_ID", "1"), ("BRIDGE_L1_CHAIN_ID", "1")]);

        let err = BridgeConfig::load(None).unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("L1 chain_id")));
    }
}
