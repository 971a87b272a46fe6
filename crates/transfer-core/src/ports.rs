//! # Outbound Ports
//!
//! Narrow node interfaces the bakers read chain state through and submit to.
//! Implementations wrap whatever RPC, indexer or HTTP API the host app uses.

use async_trait::async_trait;
use thiserror::Error;

use chain_eth::EthAddress;
use chain_ton::TonAddress;
use chain_tron::TronAddress;

use crate::error::TransferError;
use crate::types::Deployment;

/// Failure reported by a node client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Transport failure, timeout or an unusable response.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The node understood the request and refused it.
    #[error("rejected ({code}): {message}")]
    Rejected { code: String, message: String },
}

impl ClientError {
    /// Read semantics: any failure of a required read means the chain is unreachable.
    pub fn during_read(self) -> TransferError {
        TransferError::NetworkUnavailable(self.to_string())
    }
}

/// Sequence number (seqno / nonce) and whether the account's contract exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceStatus {
    pub sequence: u64,
    pub deployment: Deployment,
}

/// Current two-part EVM fee market.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeMarketRate {
    pub base_fee: u128,
    pub priority_fee: u128,
}

/// Call shape passed to `eth_estimateGas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: EthAddress,
    pub to: EthAddress,
    pub value: u128,
    pub data: Vec<u8>,
}

/// Outcome of emulating an external message against current TON state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOutcome {
    /// Signed change of the sender's balance, in nanotons.
    pub balance_delta: i128,
}

/// Node-side builder request for a TRON transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TronTransfer {
    /// `wallet/createtransaction`
    Trx {
        owner: TronAddress,
        to: TronAddress,
        amount: u128,
    },
    /// `wallet/transferasset`
    Trc10 {
        owner: TronAddress,
        to: TronAddress,
        asset_id: String,
        amount: u128,
    },
    /// `wallet/triggersmartcontract` with `transfer(address,uint256)`
    Trc20 {
        owner: TronAddress,
        contract: TronAddress,
        /// Hex ABI arguments.
        parameter: String,
        fee_limit: u64,
    },
}

/// Unsigned transaction as returned by a TRON node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TronNodeTransaction {
    /// `txID`, hex.
    pub tx_id: String,
    /// `raw_data_hex`, decoded.
    pub raw_data: Vec<u8>,
}

/// Result of `wallet/triggerconstantcontract`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantCallResult {
    pub energy_used: u64,
}

#[async_trait]
pub trait TonClient: Send + Sync {
    async fn get_balance(&self, address: &TonAddress) -> Result<u128, ClientError>;

    async fn get_sequence_and_deployment_status(
        &self,
        address: &TonAddress,
    ) -> Result<SequenceStatus, ClientError>;

    /// DNS lookup for `.ton` / `.t.me` names.
    async fn resolve_name(&self, name: &str) -> Result<Option<TonAddress>, ClientError>;

    /// The owner's jetton wallet for a jetton master (`get_wallet_address`).
    async fn resolve_asset_sub_address(
        &self,
        master: &TonAddress,
        owner: &TonAddress,
    ) -> Result<Option<TonAddress>, ClientError>;

    async fn simulate(&self, boc: &[u8]) -> Result<SimulationOutcome, ClientError>;

    async fn submit_raw_transaction(&self, boc: &[u8]) -> Result<(), ClientError>;
}

#[async_trait]
pub trait EvmClient: Send + Sync {
    async fn get_balance(&self, address: &EthAddress) -> Result<u128, ClientError>;

    async fn get_sequence_and_deployment_status(
        &self,
        address: &EthAddress,
    ) -> Result<SequenceStatus, ClientError>;

    async fn get_fee_market_rate(&self) -> Result<FeeMarketRate, ClientError>;

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, ClientError>;

    /// ERC-20 `balanceOf(owner)`.
    async fn get_token_balance(
        &self,
        token: &EthAddress,
        owner: &EthAddress,
    ) -> Result<u128, ClientError>;

    /// ENS lookup for `.eth` names.
    async fn resolve_name(&self, name: &str) -> Result<Option<EthAddress>, ClientError>;

    /// Returns the transaction hash reported by the node.
    async fn submit_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, ClientError>;
}

#[async_trait]
pub trait TronClient: Send + Sync {
    async fn get_balance(&self, address: &TronAddress) -> Result<u128, ClientError>;

    /// TRC-20 `balanceOf(owner)`.
    async fn get_token_balance(
        &self,
        contract: &TronAddress,
        owner: &TronAddress,
    ) -> Result<u128, ClientError>;

    async fn create_transaction(
        &self,
        transfer: &TronTransfer,
    ) -> Result<TronNodeTransaction, ClientError>;

    /// Dry run through `triggerconstantcontract`.
    async fn estimate_energy(
        &self,
        transfer: &TronTransfer,
    ) -> Result<ConstantCallResult, ClientError>;

    /// Raw `prices` string of `wallet/getenergyprices`.
    async fn get_energy_prices(&self) -> Result<Option<String>, ClientError>;

    /// `wallet/broadcasthex`; returns the node's txid.
    async fn submit_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, ClientError>;
}
