//! Ethers-backed building blocks for the chain client side of the bridge.

pub mod logging;
pub mod receipts;
pub mod wallet;

pub use receipts::ReceiptWatcher;
pub use wallet::KeyedWallet;

/// Adapter result type
pub type Result<T> = std::result::Result<T, Error>;

/// Adapter error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Invalid RPC endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
}
