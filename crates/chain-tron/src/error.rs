use thiserror::Error;

/// TRON chain operation errors.
#[derive(Debug, Error)]
pub enum TronError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("transaction id mismatch: {0}")]
    TransactionIdMismatch(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

impl From<chain_eth::EthError> for TronError {
    fn from(err: chain_eth::EthError) -> Self {
        match err {
            chain_eth::EthError::InvalidPublicKey(msg) => TronError::InvalidPublicKey(msg),
            other => TronError::EncodingError(other.to_string()),
        }
    }
}
