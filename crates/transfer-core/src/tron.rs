//! TRON baker: TRX, TRC-10 and TRC-20 transfers.
//!
//! The node builds `raw_data`; the engine only checks that the node's txID is
//! `sha256(raw_data)` and hands that id out as the digest to sign.

use std::sync::Arc;

use async_trait::async_trait;
use chain_tron::TronAddress;
use tracing::{debug, info, warn};

use crate::config::TronConfig;
use crate::error::TransferError;
use crate::fee::{self, FeeEstimate};
use crate::guard::{self, Spend, TokenSpend};
use crate::ports::{ClientError, TronClient, TronTransfer};
use crate::resolver::resolve_tron;
use crate::selector::select_tron_account;
use crate::state::{StateReader, StateWriter};
use crate::types::{
    Asset, BakedTransfer, BroadcastResult, ChainFamily, FeeQuote, SigningDigest, TransferIntent,
};
use crate::Baker;

const TAG_OWNER: u8 = 1;
const TAG_RAW_DATA: u8 = 2;
const TAG_FEE: u8 = 3;

/// Length of `r ‖ s ‖ v`.
const SIGNATURE_LEN: usize = 65;

/// Node-built `raw_data` plus the account it was baked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TronEnvelope {
    pub owner: TronAddress,
    pub raw_data: Vec<u8>,
    pub fee: u128,
}

impl TronEnvelope {
    pub fn digest(&self) -> SigningDigest {
        chain_tron::transaction_id(&self.raw_data)
    }

    pub fn to_state(&self) -> Vec<u8> {
        StateWriter::new(ChainFamily::Tron)
            .field(TAG_OWNER, self.owner.as_bytes())
            .field(TAG_RAW_DATA, &self.raw_data)
            .u128_field(TAG_FEE, self.fee)
            .finish()
    }

    pub fn from_state(blob: &[u8]) -> Result<Self, TransferError> {
        let mut r = StateReader::open(blob, ChainFamily::Tron)?;
        let owner = TronAddress::from_bytes(r.field(TAG_OWNER)?)
            .map_err(|e| TransferError::MalformedResumableState(format!("owner: {e}")))?;
        let raw_data = r.field(TAG_RAW_DATA)?.to_vec();
        let fee = r.u128_field(TAG_FEE)?;
        r.finish()?;
        Ok(Self {
            owner,
            raw_data,
            fee,
        })
    }
}

/// Token standard implied by the intent's asset string.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TronAsset {
    Trx,
    /// Numeric asset id.
    Trc10(String),
    Trc20(TronAddress),
}

fn classify(asset: &Asset) -> Result<TronAsset, TransferError> {
    match asset {
        Asset::Native => Ok(TronAsset::Trx),
        Asset::Contract(id) => {
            if let Ok(contract) = TronAddress::parse(id) {
                Ok(TronAsset::Trc20(contract))
            } else if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) {
                Ok(TronAsset::Trc10(id.clone()))
            } else {
                Err(TransferError::InvalidIntent(format!(
                    "{id:?} is neither a TRC-20 contract nor a TRC-10 asset id"
                )))
            }
        }
    }
}

pub struct TronBaker {
    client: Arc<dyn TronClient>,
    config: TronConfig,
}

impl TronBaker {
    pub fn new(client: Arc<dyn TronClient>, config: TronConfig) -> Self {
        Self { client, config }
    }

    /// Energy quote for a contract call; bandwidth-only transfers cost nothing.
    async fn estimate_fee(&self, transfer: &TronTransfer) -> FeeEstimate {
        if !matches!(transfer, TronTransfer::Trc20 { .. }) {
            return FeeEstimate::exact(FeeQuote::zero());
        }

        let (energy, prices) = futures::join!(
            self.client.estimate_energy(transfer),
            self.client.get_energy_prices()
        );
        let price = match prices {
            Ok(prices) => {
                chain_tron::parse_energy_price(prices.as_deref(), self.config.default_energy_price)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    price = self.config.default_energy_price,
                    "energy price read failed, using default"
                );
                self.config.default_energy_price
            }
        };
        match energy {
            Ok(result) => FeeEstimate::exact(fee::energy(result.energy_used, price)),
            Err(e) => {
                warn!(error = %e, "energy estimation failed, quoting zero fee");
                FeeEstimate::degraded(ChainFamily::Tron, "estimate_energy", e.to_string())
            }
        }
    }
}

#[async_trait]
impl Baker for TronBaker {
    fn family(&self) -> ChainFamily {
        ChainFamily::Tron
    }

    async fn bake(&self, intent: &TransferIntent) -> Result<BakedTransfer, TransferError> {
        let (_, owner) = select_tron_account(&intent.sender.public_key, &intent.sender.address)?;
        let recipient = resolve_tron(&intent.recipient)?;
        let asset = classify(&intent.asset)?;
        debug!(
            owner = %owner,
            recipient = %recipient.address,
            asset = ?asset,
            "baking TRON transfer"
        );

        let transfer = match &asset {
            TronAsset::Trx => TronTransfer::Trx {
                owner,
                to: recipient.address,
                amount: intent.amount,
            },
            TronAsset::Trc10(asset_id) => TronTransfer::Trc10 {
                owner,
                to: recipient.address,
                asset_id: asset_id.clone(),
                amount: intent.amount,
            },
            TronAsset::Trc20(contract) => TronTransfer::Trc20 {
                owner,
                contract: *contract,
                parameter: chain_tron::trc20_transfer_parameter(&recipient.address, intent.amount),
                fee_limit: self.config.fee_limit,
            },
        };

        let client = self.client.as_ref();
        let (balance, token_balance, node_tx) = futures::try_join!(
            async { client.get_balance(&owner).await.map_err(ClientError::during_read) },
            async {
                match &asset {
                    TronAsset::Trc20(contract) => client
                        .get_token_balance(contract, &owner)
                        .await
                        .map(Some)
                        .map_err(ClientError::during_read),
                    _ => Ok(None),
                }
            },
            async {
                client
                    .create_transaction(&transfer)
                    .await
                    .map_err(ClientError::during_read)
            },
        )?;
        let tx_id = chain_tron::verify_transaction_id(&node_tx.raw_data, &node_tx.tx_id)?;
        debug!(balance, tx_id = %hex::encode(tx_id), "TRON reads complete");

        let estimate = self.estimate_fee(&transfer).await;
        let native_value = match asset {
            TronAsset::Trx => intent.amount,
            TronAsset::Trc10(_) | TronAsset::Trc20(_) => 0,
        };
        guard::check(Spend {
            value: native_value,
            fee: estimate.total(),
            balance,
        })?;
        if let Some(token_balance) = token_balance {
            guard::check_token(TokenSpend {
                amount: intent.amount,
                balance: token_balance,
            })?;
        }

        let envelope = TronEnvelope {
            owner,
            raw_data: node_tx.raw_data,
            fee: estimate.total(),
        };
        debug!(fee = envelope.fee, "TRON bake complete");
        Ok(BakedTransfer {
            signing_digest: tx_id,
            estimated_fee: envelope.fee,
            opaque_state: envelope.to_state(),
            fee_quote: estimate.quote,
            warnings: estimate.warning.into_iter().collect(),
        })
    }

    async fn send(
        &self,
        state: &[u8],
        signature: &[u8],
        intent: &TransferIntent,
    ) -> Result<BroadcastResult, TransferError> {
        let envelope = TronEnvelope::from_state(state)?;
        let sender = TronAddress::parse(&intent.sender.address)
            .map_err(|e| TransferError::InvalidIntent(format!("sender address: {e}")))?;
        if sender != envelope.owner {
            return Err(TransferError::MalformedResumableState(
                "state was baked for a different sender".into(),
            ));
        }
        if signature.len() != SIGNATURE_LEN {
            return Err(TransferError::SignatureFraming(format!(
                "TRON signatures are {SIGNATURE_LEN} bytes, got {}",
                signature.len()
            )));
        }

        let wire = chain_tron::encode_signed_transaction(&envelope.raw_data, &[signature]);
        let node_id = self.client.submit_raw_transaction(&wire).await?;
        let tx_id = if node_id.is_empty() {
            hex::encode(envelope.digest())
        } else {
            node_id
        };
        info!(tx_id = %tx_id, owner = %envelope.owner, "TRON transfer submitted");
        Ok(BroadcastResult { tx_id })
    }

    fn digest_of_state(&self, state: &[u8]) -> Result<SigningDigest, TransferError> {
        Ok(TronEnvelope::from_state(state)?.digest())
    }
}
