use async_trait::async_trait;
use bridge_core::{DomainConfig, WalletProvider};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::time::Duration;

use crate::{Error, Result};

/// Polling interval for clients built from a domain config
pub const CLIENT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Signing client bound to one chain
pub type SigningClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Wallet backed by a locally held private key
pub struct KeyedWallet {
    signer: LocalWallet,
}

impl KeyedWallet {
    /// Accepts a hex private key with or without `0x`
    pub fn from_private_key(key: &str) -> Result<Self> {
        let signer = key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| Error::InvalidKey(e.to_string()))?;
        Ok(Self { signer })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Read-only provider for one side of the bridge
    pub fn provider_for(domain: &DomainConfig) -> Result<Provider<Http>> {
        if !domain.rpc_url.starts_with("http://") && !domain.rpc_url.starts_with("https://") {
            return Err(Error::InvalidEndpoint {
                url: domain.rpc_url.clone(),
                reason: "signing clients need an http(s) endpoint".to_string(),
            });
        }

        let provider = Provider::<Http>::try_from(domain.rpc_url.as_str()).map_err(|e| Error::InvalidEndpoint {
            url: domain.rpc_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(provider.interval(CLIENT_POLL_INTERVAL))
    }

    /// Signing client whose transactions carry the domain's chain id
    pub fn client_for(&self, domain: &DomainConfig) -> Result<SigningClient> {
        let provider = Self::provider_for(domain)?;
        let signer = self.signer.clone().with_chain_id(domain.chain_id);
        Ok(SignerMiddleware::new(provider, signer))
    }
}

#[async_trait]
impl WalletProvider for KeyedWallet {
    async fn resolve_account(&self) -> Option<Address> {
        Some(self.signer.address())
    }
}
