//! Recipient resolution: a free-form string to a canonical chain address plus
//! delivery metadata. Each resolver performs at most one network read.

use chain_eth::EthAddress;
use chain_ton::TonAddress;
use chain_tron::TronAddress;
use tracing::debug;

use crate::error::TransferError;
use crate::ports::{EvmClient, TonClient};
use crate::types::{DeliveryMode, ResolvedAddress};

const TON_NAME_SUFFIXES: [&str; 2] = [".ton", ".t.me"];
const ENS_SUFFIX: &str = ".eth";

fn unresolved(recipient: &str) -> TransferError {
    TransferError::AddressResolution(format!("unrecognised recipient {recipient:?}"))
}

pub fn is_ton_name(recipient: &str) -> bool {
    let lower = recipient.to_ascii_lowercase();
    TON_NAME_SUFFIXES
        .iter()
        .any(|suffix| lower.len() > suffix.len() && lower.ends_with(suffix))
}

pub fn is_ens_name(recipient: &str) -> bool {
    let lower = recipient.to_ascii_lowercase();
    lower.len() > ENS_SUFFIX.len() && lower.ends_with(ENS_SUFFIX)
}

/// Parses a TON address without any lookup; `None` if it is not an address.
pub fn parse_ton_address(s: &str) -> Option<ResolvedAddress<TonAddress>> {
    if let Ok(addr) = TonAddress::parse_raw(s) {
        return Some(ResolvedAddress::direct(addr, DeliveryMode::NonBounceable));
    }
    TonAddress::parse_friendly(s).ok().map(|f| {
        let delivery = if f.bounceable {
            DeliveryMode::Bounceable
        } else {
            DeliveryMode::NonBounceable
        };
        ResolvedAddress::direct(f.address, delivery)
    })
}

/// Raw form is non-bounceable, friendly form carries its own flag, DNS names
/// are looked up and always non-bounceable.
pub async fn resolve_ton(
    client: &dyn TonClient,
    recipient: &str,
) -> Result<ResolvedAddress<TonAddress>, TransferError> {
    let recipient = recipient.trim();
    if let Some(resolved) = parse_ton_address(recipient) {
        return Ok(resolved);
    }
    if !is_ton_name(recipient) {
        return Err(unresolved(recipient));
    }

    let address = client
        .resolve_name(recipient)
        .await
        .map_err(|e| e.during_read())?
        .ok_or_else(|| {
            TransferError::AddressResolution(format!("{recipient} has no wallet record"))
        })?;
    debug!(name = recipient, address = %address.to_raw_string(), "resolved TON name");
    Ok(ResolvedAddress::from_name_service(address, DeliveryMode::NonBounceable))
}

pub async fn resolve_evm(
    client: &dyn EvmClient,
    recipient: &str,
) -> Result<ResolvedAddress<EthAddress>, TransferError> {
    let recipient = recipient.trim();
    if recipient.starts_with("0x") || recipient.starts_with("0X") {
        let address = chain_eth::parse_address(recipient)
            .map_err(|e| TransferError::AddressResolution(e.to_string()))?;
        return Ok(ResolvedAddress::direct(address, DeliveryMode::Standard));
    }
    if !is_ens_name(recipient) {
        return Err(unresolved(recipient));
    }

    let address = client
        .resolve_name(recipient)
        .await
        .map_err(|e| e.during_read())?
        .ok_or_else(|| {
            TransferError::AddressResolution(format!("{recipient} has no address record"))
        })?;
    debug!(name = recipient, address = %chain_eth::to_checksum(&address), "resolved ENS name");
    Ok(ResolvedAddress::from_name_service(address, DeliveryMode::Standard))
}

pub fn resolve_tron(recipient: &str) -> Result<ResolvedAddress<TronAddress>, TransferError> {
    let recipient = recipient.trim();
    TronAddress::parse(recipient)
        .map(|a| ResolvedAddress::direct(a, DeliveryMode::Standard))
        .map_err(|e| TransferError::AddressResolution(format!("{recipient:?}: {e}")))
}
