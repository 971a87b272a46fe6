//! EVM baker: EIP-1559 value transfers and ERC-20 `transfer` calls.

use std::sync::Arc;

use async_trait::async_trait;
use chain_eth::{EthAddress, EthSignature, EthTransaction, FeeCaps};
use tracing::{debug, info, warn};

use crate::config::EvmConfig;
use crate::error::TransferError;
use crate::fee::{self, FeeEstimate};
use crate::guard::{self, Spend, TokenSpend};
use crate::ports::{CallRequest, ClientError, EvmClient};
use crate::resolver::resolve_evm;
use crate::selector::select_evm_account;
use crate::state::{StateReader, StateWriter};
use crate::types::{
    Asset, BakedTransfer, BroadcastResult, ChainFamily, SigningDigest, TransferIntent,
};
use crate::Baker;

const TAG_SENDER: u8 = 1;
const TAG_TRANSACTION: u8 = 2;
const TAG_FEE: u8 = 3;

/// Unsigned transaction plus the account it was baked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmEnvelope {
    pub sender: EthAddress,
    pub transaction: EthTransaction,
    pub fee: u128,
}

impl EvmEnvelope {
    pub fn digest(&self) -> SigningDigest {
        self.transaction.signing_hash()
    }

    pub fn to_state(&self) -> Vec<u8> {
        StateWriter::new(ChainFamily::Evm)
            .field(TAG_SENDER, &self.sender)
            .field(TAG_TRANSACTION, &self.transaction.encode_unsigned())
            .u128_field(TAG_FEE, self.fee)
            .finish()
    }

    pub fn from_state(blob: &[u8]) -> Result<Self, TransferError> {
        let mut r = StateReader::open(blob, ChainFamily::Evm)?;
        let sender = r.array::<20>(TAG_SENDER)?;
        let transaction = EthTransaction::decode_unsigned(r.field(TAG_TRANSACTION)?)
            .map_err(|e| TransferError::MalformedResumableState(format!("transaction: {e}")))?;
        let fee = r.u128_field(TAG_FEE)?;
        r.finish()?;
        Ok(Self {
            sender,
            transaction,
            fee,
        })
    }
}

/// Frames the external signature. An empty one becomes the all-zero
/// signature so the node, not the engine, rejects it.
fn frame_signature(signature: &[u8]) -> Result<EthSignature, TransferError> {
    if signature.is_empty() {
        warn!("empty EVM signature, submitting the zero signature");
        return Ok(EthSignature::default());
    }
    EthSignature::from_bytes(signature).map_err(|e| TransferError::SignatureFraming(e.to_string()))
}

pub struct EvmBaker {
    client: Arc<dyn EvmClient>,
    config: EvmConfig,
}

impl EvmBaker {
    pub fn new(client: Arc<dyn EvmClient>, config: EvmConfig) -> Self {
        Self { client, config }
    }

    fn default_gas_limit(&self, token: Option<&EthAddress>) -> u64 {
        if token.is_some() {
            self.config.token_gas_limit
        } else {
            self.config.native_gas_limit
        }
    }
}

#[async_trait]
impl Baker for EvmBaker {
    fn family(&self) -> ChainFamily {
        ChainFamily::Evm
    }

    async fn bake(&self, intent: &TransferIntent) -> Result<BakedTransfer, TransferError> {
        let (_, sender) = select_evm_account(&intent.sender.public_key, &intent.sender.address)?;
        let token = match &intent.asset {
            Asset::Native => None,
            Asset::Contract(contract) => Some(chain_eth::parse_address(contract).map_err(|e| {
                TransferError::InvalidIntent(format!("token contract {contract:?}: {e}"))
            })?),
        };
        debug!(
            sender = %chain_eth::to_checksum(&sender),
            chain_id = self.config.chain_id,
            token = token.is_some(),
            "baking EVM transfer"
        );

        let client = self.client.as_ref();
        let required = async {
            futures::try_join!(
                resolve_evm(client, &intent.recipient),
                async { client.get_balance(&sender).await.map_err(ClientError::during_read) },
                async {
                    client
                        .get_sequence_and_deployment_status(&sender)
                        .await
                        .map_err(ClientError::during_read)
                },
                async {
                    match &token {
                        Some(t) => client
                            .get_token_balance(t, &sender)
                            .await
                            .map(Some)
                            .map_err(ClientError::during_read),
                        None => Ok(None),
                    }
                },
            )
        };
        let (required, rate) = futures::join!(required, client.get_fee_market_rate());
        let (recipient, balance, status, token_balance) = required?;
        debug!(nonce = status.sequence, balance, "EVM reads complete");

        let gas_fallback = self.default_gas_limit(token.as_ref());
        let mut transaction = match token {
            None => EthTransaction::native(
                self.config.chain_id,
                status.sequence,
                recipient.address,
                intent.amount,
                FeeCaps::default(),
                gas_fallback,
            ),
            Some(token) => EthTransaction::token(
                self.config.chain_id,
                status.sequence,
                token,
                &recipient.address,
                intent.amount,
                FeeCaps::default(),
                gas_fallback,
            ),
        };

        let (estimate, caps, gas_limit) = match rate {
            Err(e) => {
                warn!(error = %e, "EVM fee market read failed, quoting zero fee");
                (
                    FeeEstimate::degraded(ChainFamily::Evm, "fee_market_rate", e.to_string()),
                    FeeCaps::default(),
                    gas_fallback,
                )
            }
            Ok(rate) => {
                let caps = FeeCaps::from_rates(rate.base_fee, rate.priority_fee);
                let call = CallRequest {
                    from: sender,
                    to: transaction.to,
                    value: transaction.value,
                    data: transaction.data.clone(),
                };
                match client.estimate_gas(&call).await {
                    Ok(gas) => {
                        let total = fee::dynamic_two_part(rate.base_fee, rate.priority_fee, gas);
                        (FeeEstimate::exact(total), caps, gas)
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            gas_limit = gas_fallback,
                            "gas estimation failed, quoting zero fee"
                        );
                        (
                            FeeEstimate::degraded(ChainFamily::Evm, "estimate_gas", e.to_string()),
                            caps,
                            gas_fallback,
                        )
                    }
                }
            }
        };
        transaction.max_priority_fee_per_gas = caps.max_priority_fee_per_gas;
        transaction.max_fee_per_gas = caps.max_fee_per_gas;
        transaction.gas_limit = gas_limit;

        guard::check(Spend {
            value: transaction.value,
            fee: estimate.total(),
            balance,
        })?;
        if let Some(token_balance) = token_balance {
            guard::check_token(TokenSpend {
                amount: intent.amount,
                balance: token_balance,
            })?;
        }

        let envelope = EvmEnvelope {
            sender,
            transaction,
            fee: estimate.total(),
        };
        debug!(fee = envelope.fee, gas_limit, "EVM bake complete");
        Ok(BakedTransfer {
            signing_digest: envelope.digest(),
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
        let envelope = EvmEnvelope::from_state(state)?;
        let sender = chain_eth::parse_address(&intent.sender.address)
            .map_err(|e| TransferError::InvalidIntent(format!("sender address: {e}")))?;
        if sender != envelope.sender {
            return Err(TransferError::MalformedResumableState(
                "state was baked for a different sender".into(),
            ));
        }

        let signature = frame_signature(signature)?;
        let raw = envelope.transaction.encode_signed(&signature);
        let node_id = self.client.submit_raw_transaction(&raw).await?;
        let tx_id = if node_id.is_empty() {
            chain_eth::transaction_hash(&raw)
        } else {
            node_id
        };
        info!(tx_id = %tx_id, nonce = envelope.transaction.nonce, "EVM transfer submitted");
        Ok(BroadcastResult { tx_id })
    }

    fn digest_of_state(&self, state: &[u8]) -> Result<SigningDigest, TransferError> {
        Ok(EvmEnvelope::from_state(state)?.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> EvmEnvelope {
        EvmEnvelope {
            sender: [0x11; 20],
            transaction: EthTransaction::native(
                1,
                7,
                [0x22; 20],
                100_000,
                FeeCaps::from_rates(10, 5),
                1_000,
            ),
            fee: 15_000,
        }
    }

    #[test]
    fn state_roundtrip() {
        let env = envelope();
        let parsed = EvmEnvelope::from_state(&env.to_state()).unwrap();
        assert_eq!(parsed, env);
        assert_eq!(parsed.digest(), env.digest());
    }

    #[test]
    fn empty_signature_is_zero() {
        assert_eq!(frame_signature(&[]).unwrap(), EthSignature::default());
    }

    #[test]
    fn odd_signature_length_is_framing_error() {
        assert!(matches!(
            frame_signature(&[1; 63]),
            Err(TransferError::SignatureFraming(_))
        ));
    }

    #[test]
    fn compact_and_full_signatures_frame() {
        let mut full = [0x01u8; 65];
        full[64] = 28;
        let sig = frame_signature(&full).unwrap();
        assert!(sig.y_parity);
        assert_eq!(frame_signature(&sig.to_compact()).unwrap(), sig);
    }
}
