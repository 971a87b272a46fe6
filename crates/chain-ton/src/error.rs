use thiserror::Error;

/// TON chain operation errors.
#[derive(Debug, Error)]
pub enum TonError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("cell overflow: {0}")]
    CellOverflow(String),

    #[error("boc error: {0}")]
    BocError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}
