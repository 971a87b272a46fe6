//! Keyless transfer baking and broadcast for TON, EVM and TRON.
//!
//! A transfer is handled in two calls. [`Baker::bake`] reads chain state,
//! builds the unsigned transaction and returns the 32-byte digest to sign with
//! an opaque resumable state. [`Baker::send`] takes that state back together
//! with a signature produced elsewhere, frames the signed transaction and
//! submits it. The engine never sees a private key.

pub mod clock;
pub mod config;
pub mod error;
pub mod evm;
pub mod fee;
pub mod guard;
pub mod logging;
pub mod ports;
pub mod resolver;
pub mod selector;
pub mod state;
pub mod ton;
pub mod tron;
pub mod types;

use async_trait::async_trait;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::TransferError;
pub use evm::{EvmBaker, EvmEnvelope};
pub use fee::FeeEstimationFailure;
pub use ton::{TonBaker, TonEnvelope};
pub use tron::{TronBaker, TronEnvelope};
pub use types::{
    Asset, BakedTransfer, BroadcastResult, ChainFamily, FeeQuote, Sender, SigningDigest,
    TransferIntent,
};

/// One chain family's bake / send pipeline.
#[async_trait]
pub trait Baker: Send + Sync {
    fn family(&self) -> ChainFamily;

    /// Builds the unsigned transaction. Fails if `amount + fee` exceeds the balance.
    async fn bake(&self, intent: &TransferIntent) -> Result<BakedTransfer, TransferError>;

    /// Attaches `signature` to the transaction in `state` and submits it.
    /// Performs no chain reads.
    async fn send(
        &self,
        state: &[u8],
        signature: &[u8],
        intent: &TransferIntent,
    ) -> Result<BroadcastResult, TransferError>;

    /// Recomputes the signing digest from a state blob.
    fn digest_of_state(&self, state: &[u8]) -> Result<SigningDigest, TransferError>;
}
