use ethers::providers::{JsonRpcError, ProviderError, RpcError};
use serde::Serialize;

use crate::Error;

/// EIP-1193 "User Rejected Request"
pub const USER_REJECTED_CODE: i64 = 4001;

/// Coarse error category, stable for UI consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotConnected,
    ConfigError,
    InvalidAmount,
    InvalidAsset,
    UserRejected,
    InsufficientFunds,
    Generic,
}

/// Normalizes a failure raised by any transfer step.
///
/// Structured signals win over wording: an already normalized [`Error`]
/// is kept as is, then JSON-RPC error codes are checked, and only then
/// the message text of every cause in the chain.
pub fn classify(err: &anyhow::Error) -> Error {
    for cause in err.chain() {
        if let Some(normalized) = cause.downcast_ref::<Error>() {
            return normalized.clone();
        }
    }

    if let Some(kind) = classify_by_code(err) {
        return kind;
    }

    for cause in err.chain() {
        if let Some(kind) = classify_by_message(&cause.to_string()) {
            return kind;
        }
    }

    Error::Generic(err.to_string())
}

fn classify_by_code(err: &anyhow::Error) -> Option<Error> {
    err.chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<ProviderError>()
                .and_then(|provider| provider.as_error_response())
                .or_else(|| cause.downcast_ref::<JsonRpcError>())
                .map(|response| response.code)
        })
        .and_then(|code| (code == USER_REJECTED_CODE).then_some(Error::UserRejected))
}

/// Substring fallback for collaborators that only surface text
pub fn classify_by_message(message: &str) -> Option<Error> {
    let message = message.to_ascii_lowercase();
    if message.contains("user rejected") {
        Some(Error::UserRejected)
    } else if message.contains("insufficient funds") {
        Some(Error::InsufficientFunds)
    } else {
        None
    }
}
