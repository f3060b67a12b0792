pub mod config;
pub mod domain;
pub mod messenger;
pub mod transfer;

pub use config::{BridgeConfig, DomainConfig, NativeTokenConfig};
pub use domain::{AssetRef, ChainId, Domain, NativeAmount};
pub use messenger::{CrossDomainMessenger, MessageStatus, MessengerConnector, PendingTx, TxOverrides, WalletProvider};
pub use transfer::{
    AssetWithdrawalReceipt, DepositReceipt, ErrorKind, Phase, TransferEvent, TransferKind, TransferOrchestrator,
    TransferState, TxStep, WithdrawalReceipt,
};

/// Core result type for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    #[error("Transaction rejected by user")]
    UserRejected,

    #[error("Insufficient funds for transaction")]
    InsufficientFunds,

    #[error("{0}")]
    Generic(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotConnected => ErrorKind::NotConnected,
            Error::ConfigError(_) => ErrorKind::ConfigError,
            Error::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Error::InvalidAsset(_) => ErrorKind::InvalidAsset,
            Error::UserRejected => ErrorKind::UserRejected,
            Error::InsufficientFunds => ErrorKind::InsufficientFunds,
            Error::Generic(_) => ErrorKind::Generic,
        }
    }
}

impl From<::config::ConfigError> for Error {
    fn from(err: ::config::ConfigError) -> Self {
        Error::ConfigError(err.to_string())
    }
}
