//! In-memory node clients and test keys shared by the pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chain_eth::EthAddress;
use chain_ton::{TonAddress, WalletVersion};
use chain_tron::TronAddress;

use transfer_core::ports::{
    CallRequest, ClientError, ConstantCallResult, EvmClient, FeeMarketRate, SequenceStatus,
    SimulationOutcome, TonClient, TronClient, TronNodeTransaction, TronTransfer,
};
use transfer_core::types::{Asset, Deployment, Sender, TransferIntent};

fn mock_failure() -> ClientError {
    ClientError::Unavailable("Mock failure".to_string())
}

fn deployment(deployed: bool) -> Deployment {
    if deployed {
        Deployment::Deployed
    } else {
        Deployment::Undeployed
    }
}

// ─── Keys ────────────────────────────────────────────────────────────

pub fn ton_signing_key() -> ed25519_dalek::SigningKey {
    ed25519_dalek::SigningKey::from_bytes(&[7u8; 32])
}

pub fn ton_public_key() -> [u8; 32] {
    ton_signing_key().verifying_key().to_bytes()
}

/// Sender controlling a `version` wallet in the basechain.
pub fn ton_sender(version: WalletVersion) -> (Sender, TonAddress) {
    let address = version
        .derive_address(&ton_public_key(), 0)
        .expect("derivable");
    let sender = Sender {
        address: address.to_friendly(false, false, true),
        public_key: ton_public_key().to_vec(),
    };
    (sender, address)
}

pub fn secp_signing_key() -> k256::ecdsa::SigningKey {
    k256::ecdsa::SigningKey::from_slice(&[0x42u8; 32]).expect("valid scalar")
}

pub fn secp_public_key() -> Vec<u8> {
    secp_signing_key()
        .verifying_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec()
}

/// `r ‖ s ‖ v` over a prehashed digest.
pub fn secp_sign(digest: &[u8; 32]) -> Vec<u8> {
    let (signature, recovery_id) = secp_signing_key()
        .sign_prehash_recoverable(digest)
        .expect("signable");
    let mut out = signature.to_bytes().to_vec();
    out.push(recovery_id.to_byte());
    out
}

pub fn evm_sender() -> (Sender, EthAddress) {
    let address = chain_eth::address_from_public_key(&secp_public_key()).expect("valid key");
    let sender = Sender {
        address: chain_eth::to_checksum(&address),
        public_key: secp_public_key(),
    };
    (sender, address)
}

pub fn tron_sender() -> (Sender, TronAddress) {
    let address = TronAddress::from_public_key(&secp_public_key()).expect("valid key");
    let sender = Sender {
        address: address.to_base58(),
        public_key: secp_public_key(),
    };
    (sender, address)
}

pub fn intent(sender: Sender, recipient: &str, asset: Asset, amount: u128) -> TransferIntent {
    TransferIntent {
        sender,
        recipient: recipient.to_string(),
        asset,
        amount,
        memo: None,
    }
}

// ─── TON ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockTonClient {
    pub balance: u128,
    pub seqno: u64,
    pub deployed: bool,
    /// DNS records.
    pub names: HashMap<String, TonAddress>,
    /// Jetton master to the sender's jetton wallet.
    pub jetton_wallets: HashMap<TonAddress, TonAddress>,
    pub balance_delta: i128,
    pub fail_reads: bool,
    pub fail_simulate: bool,
    pub reject_submit: Option<(String, String)>,
    pub simulated: Mutex<Vec<Vec<u8>>>,
    pub submitted: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl TonClient for MockTonClient {
    async fn get_balance(&self, _address: &TonAddress) -> Result<u128, ClientError> {
        if self.fail_reads {
            return Err(mock_failure());
        }
        Ok(self.balance)
    }

    async fn get_sequence_and_deployment_status(
        &self,
        _address: &TonAddress,
    ) -> Result<SequenceStatus, ClientError> {
        if self.fail_reads {
            return Err(mock_failure());
        }
        Ok(SequenceStatus {
            sequence: self.seqno,
            deployment: deployment(self.deployed),
        })
    }

    async fn resolve_name(&self, name: &str) -> Result<Option<TonAddress>, ClientError> {
        Ok(self.names.get(name).copied())
    }

    async fn resolve_asset_sub_address(
        &self,
        master: &TonAddress,
        _owner: &TonAddress,
    ) -> Result<Option<TonAddress>, ClientError> {
        Ok(self.jetton_wallets.get(master).copied())
    }

    async fn simulate(&self, boc: &[u8]) -> Result<SimulationOutcome, ClientError> {
        self.simulated.lock().unwrap().push(boc.to_vec());
        if self.fail_simulate {
            return Err(mock_failure());
        }
        Ok(SimulationOutcome {
            balance_delta: self.balance_delta,
        })
    }

    async fn submit_raw_transaction(&self, boc: &[u8]) -> Result<(), ClientError> {
        if let Some((code, message)) = &self.reject_submit {
            return Err(ClientError::Rejected {
                code: code.clone(),
                message: message.clone(),
            });
        }
        self.submitted.lock().unwrap().push(boc.to_vec());
        Ok(())
    }
}

// ─── EVM ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockEvmClient {
    pub balance: u128,
    pub nonce: u64,
    /// `None` makes the fee market read fail.
    pub rate: Option<FeeMarketRate>,
    /// `None` makes gas estimation fail.
    pub gas: Option<u64>,
    pub token_balance: u128,
    pub names: HashMap<String, EthAddress>,
    pub fail_reads: bool,
    pub calls: Mutex<Vec<CallRequest>>,
    pub submitted: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl EvmClient for MockEvmClient {
    async fn get_balance(&self, _address: &EthAddress) -> Result<u128, ClientError> {
        if self.fail_reads {
            return Err(mock_failure());
        }
        Ok(self.balance)
    }

    async fn get_sequence_and_deployment_status(
        &self,
        _address: &EthAddress,
    ) -> Result<SequenceStatus, ClientError> {
        if self.fail_reads {
            return Err(mock_failure());
        }
        Ok(SequenceStatus {
            sequence: self.nonce,
            deployment: Deployment::Deployed,
        })
    }

    async fn get_fee_market_rate(&self) -> Result<FeeMarketRate, ClientError> {
        self.rate.ok_or_else(mock_failure)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, ClientError> {
        self.calls.lock().unwrap().push(call.clone());
        self.gas.ok_or_else(mock_failure)
    }

    async fn get_token_balance(
        &self,
        _token: &EthAddress,
        _owner: &EthAddress,
    ) -> Result<u128, ClientError> {
        if self.fail_reads {
            return Err(mock_failure());
        }
        Ok(self.token_balance)
    }

    async fn resolve_name(&self, name: &str) -> Result<Option<EthAddress>, ClientError> {
        Ok(self.names.get(name).copied())
    }

    /// Rejects the all-zero signature the way a node fails sender recovery.
    async fn submit_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, ClientError> {
        if raw_tx.ends_with(&[0x80, 0x80, 0x80]) {
            return Err(ClientError::Rejected {
                code: "-32000".to_string(),
                message: "invalid sender".to_string(),
            });
        }
        self.submitted.lock().unwrap().push(raw_tx.to_vec());
        Ok(chain_eth::transaction_hash(raw_tx))
    }
}

// ─── TRON ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockTronClient {
    pub balance: u128,
    pub token_balance: u128,
    /// `raw_data` handed back for every transfer.
    pub raw_data: Vec<u8>,
    /// Replaces the honest txID.
    pub tx_id_override: Option<String>,
    /// `None` makes energy estimation fail.
    pub energy: Option<u64>,
    pub prices: Option<String>,
    pub fail_prices: bool,
    pub fail_reads: bool,
    pub reject_submit: Option<(String, String)>,
    /// Node txid returned on broadcast; empty leaves it to the caller.
    pub broadcast_id: Option<String>,
    pub created: Mutex<Vec<TronTransfer>>,
    pub submitted: Mutex<Vec<Vec<u8>>>,
}

#[async_trait]
impl TronClient for MockTronClient {
    async fn get_balance(&self, _address: &TronAddress) -> Result<u128, ClientError> {
        if self.fail_reads {
            return Err(mock_failure());
        }
        Ok(self.balance)
    }

    async fn get_token_balance(
        &self,
        _contract: &TronAddress,
        _owner: &TronAddress,
    ) -> Result<u128, ClientError> {
        if self.fail_reads {
            return Err(mock_failure());
        }
        Ok(self.token_balance)
    }

    async fn create_transaction(
        &self,
        transfer: &TronTransfer,
    ) -> Result<TronNodeTransaction, ClientError> {
        if self.fail_reads {
            return Err(mock_failure());
        }
        self.created.lock().unwrap().push(transfer.clone());
        let tx_id = self
            .tx_id_override
            .clone()
            .unwrap_or_else(|| hex::encode(chain_tron::transaction_id(&self.raw_data)));
        Ok(TronNodeTransaction {
            tx_id,
            raw_data: self.raw_data.clone(),
        })
    }

    async fn estimate_energy(
        &self,
        _transfer: &TronTransfer,
    ) -> Result<ConstantCallResult, ClientError> {
        self.energy
            .map(|energy_used| ConstantCallResult { energy_used })
            .ok_or_else(mock_failure)
    }

    async fn get_energy_prices(&self) -> Result<Option<String>, ClientError> {
        if self.fail_prices {
            return Err(mock_failure());
        }
        Ok(self.prices.clone())
    }

    async fn submit_raw_transaction(&self, raw_tx: &[u8]) -> Result<String, ClientError> {
        if let Some((code, message)) = &self.reject_submit {
            return Err(ClientError::Rejected {
                code: code.clone(),
                message: message.clone(),
            });
        }
        self.submitted.lock().unwrap().push(raw_tx.to_vec());
        Ok(self.broadcast_id.clone().unwrap_or_else(|| {
            hex::encode(chain_tron::transaction_id(&self.raw_data))
        }))
    }
}
