use thiserror::Error;

use crate::ports::ClientError;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Address resolution failed: {0}")]
    AddressResolution(String),

    #[error("Unsupported wallet version: {0}")]
    UnsupportedWalletVersion(String),

    #[error("Payload encoding failed: {0}")]
    PayloadEncoding(String),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u128, available: u128 },

    #[error("Malformed resumable state: {0}")]
    MalformedResumableState(String),

    #[error("Broadcast rejected ({code}): {message}")]
    BroadcastRejected { code: String, message: String },

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Invalid intent: {0}")]
    InvalidIntent(String),

    #[error("Signature framing failed: {0}")]
    SignatureFraming(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<chain_ton::TonError> for TransferError {
    fn from(e: chain_ton::TonError) -> Self {
        TransferError::PayloadEncoding(format!("TON: {e}"))
    }
}

impl From<chain_eth::EthError> for TransferError {
    fn from(e: chain_eth::EthError) -> Self {
        TransferError::PayloadEncoding(format!("EVM: {e}"))
    }
}

impl From<chain_tron::TronError> for TransferError {
    fn from(e: chain_tron::TronError) -> Self {
        TransferError::PayloadEncoding(format!("TRON: {e}"))
    }
}

/// Submission semantics: a node rejection is surfaced verbatim.
impl From<ClientError> for TransferError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Unavailable(msg) => TransferError::NetworkUnavailable(msg),
            ClientError::Rejected { code, message } => {
                TransferError::BroadcastRejected { code, message }
            }
        }
    }
}
