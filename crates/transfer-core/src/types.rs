use serde::{Deserialize, Serialize};

use crate::fee::FeeEstimationFailure;

/// Chain families the engine can bake for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainFamily {
    Ton,
    Evm,
    Tron,
}

impl ChainFamily {
    /// Byte persisted in the resumable state.
    pub fn tag(&self) -> u8 {
        match self {
            ChainFamily::Ton => 1,
            ChainFamily::Evm => 2,
            ChainFamily::Tron => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(ChainFamily::Ton),
            2 => Some(ChainFamily::Evm),
            3 => Some(ChainFamily::Tron),
            _ => None,
        }
    }

    /// Display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ChainFamily::Ton => "TON",
            ChainFamily::Evm => "EVM",
            ChainFamily::Tron => "TRON",
        }
    }
}

/// The account paying for the transfer. Only public material is ever held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub address: String,
    /// Raw public key: 32-byte Ed25519 (TON) or SEC1 secp256k1 (EVM, TRON).
    pub public_key: Vec<u8>,
}

/// What is being moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Asset {
    /// The chain's own coin.
    Native,
    /// A token identified by its contract, master or asset id.
    Contract(String),
}

impl Asset {
    /// Maps the `"native"` / `"_"` sentinels to [`Asset::Native`].
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "_" | "native" => Asset::Native,
            other => Asset::Contract(other.to_string()),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }
}

/// A request to move `amount` base units of `asset` from `sender` to `recipient`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    pub sender: Sender,
    pub recipient: String,
    pub asset: Asset,
    pub amount: u128,
    #[serde(default)]
    pub memo: Option<String>,
}

/// How the destination should treat a failed delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    Bounceable,
    NonBounceable,
    /// Families without a bounce concept.
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressOrigin {
    Direct,
    NameService,
}

/// A recipient string normalised into a chain address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress<A> {
    pub address: A,
    pub delivery: DeliveryMode,
    pub origin: AddressOrigin,
}

impl<A> ResolvedAddress<A> {
    pub fn direct(address: A, delivery: DeliveryMode) -> Self {
        Self {
            address,
            delivery,
            origin: AddressOrigin::Direct,
        }
    }

    pub fn from_name_service(address: A, delivery: DeliveryMode) -> Self {
        Self {
            address,
            delivery,
            origin: AddressOrigin::NameService,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deployment {
    Deployed,
    Undeployed,
}

/// Account model for families where the key *is* the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    ExternallyOwned,
}

/// The sender's wallet as seen at bake time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletDescriptor<V, A> {
    pub version: V,
    pub address: A,
    pub sequence: u64,
    pub deployment: Deployment,
}

/// Cost of inclusion in the chain's smallest native unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeeQuote {
    /// Price per computation unit (gas, energy); zero for simulated fees.
    pub base_rate: u128,
    pub priority_rate: Option<u128>,
    pub computation_units: u64,
    pub total: u128,
}

impl FeeQuote {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// 32-byte digest handed to the external signer.
pub type SigningDigest = [u8; 32];

/// Result of a successful bake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BakedTransfer {
    pub signing_digest: SigningDigest,
    pub estimated_fee: u128,
    /// Self-contained envelope to pass back into `send`.
    pub opaque_state: Vec<u8>,
    pub fee_quote: FeeQuote,
    /// Soft failures recorded while estimating the fee.
    pub warnings: Vec<FeeEstimationFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub tx_id: String,
}
