//! TON baker: wallet-contract transfers of TON and jettons.
//!
//! The signer signs the hash of the wallet body. `send` prepends the signature
//! to that body and wraps it in an external-in message, attaching the wallet's
//! StateInit when the contract was not yet deployed at bake time.

use std::sync::Arc;

use async_trait::async_trait;
use chain_ton::{boc, Cell, InternalMessage, TonAddress, WalletVersion};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::TonConfig;
use crate::error::TransferError;
use crate::fee::{self, FeeEstimate};
use crate::guard::{self, Spend};
use crate::ports::{ClientError, TonClient};
use crate::resolver::{parse_ton_address, resolve_ton};
use crate::selector::{select_ton_wallet, ton_public_key};
use crate::state::{StateReader, StateWriter};
use crate::types::{
    Asset, BakedTransfer, BroadcastResult, ChainFamily, DeliveryMode, Deployment, SigningDigest,
    TransferIntent, WalletDescriptor,
};
use crate::Baker;

const TAG_WALLET: u8 = 1;
const TAG_VERSION: u8 = 2;
const TAG_SEQUENCE: u8 = 3;
const TAG_BODY: u8 = 4;
const TAG_STATE_INIT: u8 = 5;
const TAG_FEE: u8 = 6;

/// Placeholder signature used when emulating the message.
const ZERO_SIGNATURE: [u8; 64] = [0u8; 64];

fn malformed(msg: impl Into<String>) -> TransferError {
    TransferError::MalformedResumableState(msg.into())
}

/// Everything `send` needs, frozen at bake time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TonEnvelope {
    pub wallet: WalletDescriptor<WalletVersion, TonAddress>,
    /// Unsigned wallet body; its hash is the signing digest.
    pub body: Arc<Cell>,
    /// Present only for undeployed wallets.
    pub state_init: Option<Arc<Cell>>,
    pub fee: u128,
}

impl TonEnvelope {
    pub fn digest(&self) -> SigningDigest {
        self.body.hash()
    }

    /// External-in message carrying `signature ‖ body`.
    pub fn external_message(&self, signature: &[u8; 64]) -> Result<Cell, TransferError> {
        let signed = chain_ton::sign_body(signature, &self.body)?;
        Ok(chain_ton::external_message(
            &self.wallet.address,
            self.state_init.as_deref(),
            &signed,
        )?)
    }

    pub fn to_state(&self) -> Vec<u8> {
        let mut wallet = Vec::with_capacity(33);
        wallet.push(self.wallet.address.workchain as u8);
        wallet.extend_from_slice(&self.wallet.address.hash);

        let state_init = self
            .state_init
            .as_ref()
            .map(boc::serialize)
            .unwrap_or_default();

        StateWriter::new(ChainFamily::Ton)
            .field(TAG_WALLET, &wallet)
            .field(TAG_VERSION, &[self.wallet.version.tag()])
            .field(TAG_SEQUENCE, &self.wallet.sequence.to_be_bytes())
            .field(TAG_BODY, &boc::serialize(&self.body))
            .field(TAG_STATE_INIT, &state_init)
            .u128_field(TAG_FEE, self.fee)
            .finish()
    }

    pub fn from_state(blob: &[u8]) -> Result<Self, TransferError> {
        let mut r = StateReader::open(blob, ChainFamily::Ton)?;
        let wallet = r.array::<33>(TAG_WALLET)?;
        let [version_tag] = r.array::<1>(TAG_VERSION)?;
        let sequence = u64::from_be_bytes(r.array::<8>(TAG_SEQUENCE)?);
        let body = r.field(TAG_BODY)?;
        let state_init = r.field(TAG_STATE_INIT)?;
        let fee = r.u128_field(TAG_FEE)?;
        r.finish()?;

        let version = WalletVersion::from_tag(version_tag)
            .ok_or_else(|| malformed(format!("unknown wallet version tag 0x{version_tag:02x}")))?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&wallet[1..]);
        let address = TonAddress::new(wallet[0] as i8, hash);

        let body = boc::deserialize(body).map_err(|e| malformed(format!("body: {e}")))?;
        let (state_init, deployment) = if state_init.is_empty() {
            (None, Deployment::Deployed)
        } else {
            let init =
                boc::deserialize(state_init).map_err(|e| malformed(format!("state init: {e}")))?;
            (Some(init), Deployment::Undeployed)
        };

        Ok(Self {
            wallet: WalletDescriptor {
                version,
                address,
                sequence,
                deployment,
            },
            body,
            state_init,
            fee,
        })
    }
}

pub struct TonBaker {
    client: Arc<dyn TonClient>,
    config: TonConfig,
    clock: Arc<dyn Clock>,
}

impl TonBaker {
    pub fn new(client: Arc<dyn TonClient>, config: TonConfig) -> Self {
        Self {
            client,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the wall clock used for `valid_until`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Emulates the envelope with a zero signature. Never fails the bake on a node error.
    async fn estimate_fee(
        &self,
        envelope: &TonEnvelope,
        value_sent: u128,
    ) -> Result<FeeEstimate, TransferError> {
        let message = Arc::new(envelope.external_message(&ZERO_SIGNATURE)?);
        match self.client.simulate(&boc::serialize(&message)).await {
            Ok(outcome) => Ok(FeeEstimate::exact(fee::simulated(
                outcome.balance_delta,
                value_sent,
            ))),
            Err(e) => {
                warn!(error = %e, "TON emulation failed, quoting zero fee");
                Ok(FeeEstimate::degraded(ChainFamily::Ton, "simulate", e.to_string()))
            }
        }
    }

    /// The internal message to put in the wallet body and the nanotons it carries.
    async fn build_message(
        &self,
        intent: &TransferIntent,
        wallet: &TonAddress,
        recipient: &TonAddress,
        delivery: DeliveryMode,
    ) -> Result<(InternalMessage, u128), TransferError> {
        let comment = match intent.memo.as_deref() {
            Some(memo) if !memo.is_empty() => Some(chain_ton::comment_body(memo)?),
            _ => None,
        };

        match &intent.asset {
            Asset::Native => {
                if intent.amount > chain_ton::MAX_COINS {
                    return Err(TransferError::PayloadEncoding(format!(
                        "{} nanotons is outside the coin range",
                        intent.amount
                    )));
                }
                let message = InternalMessage {
                    bounce: delivery == DeliveryMode::Bounceable,
                    destination: *recipient,
                    value: intent.amount,
                    body: comment,
                };
                Ok((message, intent.amount))
            }
            Asset::Contract(master) => {
                let master = parse_ton_address(master)
                    .ok_or_else(|| {
                        TransferError::InvalidIntent(format!("{master:?} is not a jetton master"))
                    })?
                    .address;
                let jetton_wallet = self
                    .client
                    .resolve_asset_sub_address(&master, wallet)
                    .await
                    .map_err(ClientError::during_read)?
                    .ok_or_else(|| {
                        TransferError::PayloadEncoding(format!(
                            "no jetton wallet for {} under master {}",
                            wallet.to_raw_string(),
                            master.to_raw_string()
                        ))
                    })?;
                debug!(jetton_wallet = %jetton_wallet.to_raw_string(), "resolved jetton wallet");

                let body = chain_ton::jetton_transfer_body(
                    intent.amount,
                    recipient,
                    wallet,
                    self.config.jetton_forward_value,
                    comment,
                )?;
                let message = InternalMessage {
                    bounce: true,
                    destination: jetton_wallet,
                    value: self.config.jetton_transfer_value,
                    body: Some(body),
                };
                Ok((message, self.config.jetton_transfer_value))
            }
        }
    }
}

#[async_trait]
impl Baker for TonBaker {
    fn family(&self) -> ChainFamily {
        ChainFamily::Ton
    }

    async fn bake(&self, intent: &TransferIntent) -> Result<BakedTransfer, TransferError> {
        let public_key = ton_public_key(&intent.sender.public_key)?;
        let (version, wallet) = select_ton_wallet(&public_key, &intent.sender.address)?;
        debug!(wallet = %wallet.to_raw_string(), version = version.name(), "baking TON transfer");

        let client = self.client.as_ref();
        let (recipient, balance, status) = futures::try_join!(
            resolve_ton(client, &intent.recipient),
            async { client.get_balance(&wallet).await.map_err(ClientError::during_read) },
            async {
                client
                    .get_sequence_and_deployment_status(&wallet)
                    .await
                    .map_err(ClientError::during_read)
            },
        )?;
        debug!(
            recipient = %recipient.address.to_raw_string(),
            balance,
            seqno = status.sequence,
            deployed = status.deployment == Deployment::Deployed,
            "TON reads complete"
        );

        let seqno = u32::try_from(status.sequence).map_err(|_| {
            let msg = format!("seqno {} does not fit 32 bits", status.sequence);
            TransferError::PayloadEncoding(msg)
        })?;
        let (message, value_sent) = self
            .build_message(intent, &wallet, &recipient.address, recipient.delivery)
            .await?;

        let valid_until =
            WalletVersion::valid_until(seqno, self.clock.now_unix(), self.config.message_ttl_secs);
        let body = version.build_signing_body(
            WalletVersion::wallet_id(wallet.workchain),
            valid_until,
            seqno,
            &[(self.config.send_mode, Arc::new(message.to_cell()?))],
        )?;
        let state_init = match status.deployment {
            Deployment::Deployed => None,
            Deployment::Undeployed => {
                Some(Arc::new(version.state_init(&public_key, wallet.workchain)?))
            }
        };

        let mut envelope = TonEnvelope {
            wallet: WalletDescriptor {
                version,
                address: wallet,
                sequence: status.sequence,
                deployment: status.deployment,
            },
            body: Arc::new(body),
            state_init,
            fee: 0,
        };

        let estimate = self.estimate_fee(&envelope, value_sent).await?;
        guard::check(Spend {
            value: value_sent,
            fee: estimate.total(),
            balance,
        })?;

        envelope.fee = estimate.total();
        debug!(fee = envelope.fee, valid_until, "TON bake complete");
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
        let envelope = TonEnvelope::from_state(state)?;
        let sender = parse_ton_address(&intent.sender.address)
            .ok_or_else(|| {
                TransferError::InvalidIntent(format!(
                    "sender address {:?} is not a TON address",
                    intent.sender.address
                ))
            })?
            .address;
        if sender != envelope.wallet.address {
            return Err(malformed("state was baked for a different sender"));
        }

        let signature: &[u8; 64] = signature.try_into().map_err(|_| {
            TransferError::SignatureFraming(format!(
                "TON signatures are 64 bytes, got {}",
                signature.len()
            ))
        })?;
        let message = Arc::new(envelope.external_message(signature)?);
        self.client
            .submit_raw_transaction(&boc::serialize(&message))
            .await?;

        let tx_id = hex::encode(message.hash());
        info!(
            tx_id = %tx_id,
            wallet = %envelope.wallet.address.to_raw_string(),
            "TON transfer submitted"
        );
        Ok(BroadcastResult { tx_id })
    }

    fn digest_of_state(&self, state: &[u8]) -> Result<SigningDigest, TransferError> {
        Ok(TonEnvelope::from_state(state)?.digest())
    }
}
