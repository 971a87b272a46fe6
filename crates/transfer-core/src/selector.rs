//! Wallet version detection: which contract revision (or account kind) the
//! sender's public key controls at the declared address.

use chain_eth::EthAddress;
use chain_ton::{TonAddress, WalletVersion};
use chain_tron::TronAddress;
use tracing::debug;

use crate::error::TransferError;
use crate::resolver::parse_ton_address;
use crate::types::AccountKind;

fn no_match(family: &str, declared: &str) -> TransferError {
    TransferError::UnsupportedWalletVersion(format!(
        "no {family} wallet for this public key matches {declared}"
    ))
}

/// Ed25519 public key of a TON sender.
pub fn ton_public_key(public_key: &[u8]) -> Result<[u8; 32], TransferError> {
    public_key.try_into().map_err(|_| {
        TransferError::InvalidIntent(format!(
            "TON public key must be 32 bytes, got {}",
            public_key.len()
        ))
    })
}

/// Scans [`WalletVersion::PRIORITY`] in the declared address's workchain; first match wins.
pub fn select_ton_wallet(
    public_key: &[u8],
    declared: &str,
) -> Result<(WalletVersion, TonAddress), TransferError> {
    let key = ton_public_key(public_key)?;
    let declared_addr = parse_ton_address(declared)
        .ok_or_else(|| {
            let msg = format!("sender address {declared:?} is not a TON address");
            TransferError::InvalidIntent(msg)
        })?
        .address;

    for version in WalletVersion::PRIORITY {
        let derived = version.derive_address(&key, declared_addr.workchain)?;
        if derived == declared_addr {
            debug!(version = version.name(), "selected TON wallet version");
            return Ok((version, derived));
        }
    }
    Err(no_match("TON", declared))
}

pub fn select_evm_account(
    public_key: &[u8],
    declared: &str,
) -> Result<(AccountKind, EthAddress), TransferError> {
    let declared_addr = chain_eth::parse_address(declared)
        .map_err(|e| TransferError::InvalidIntent(format!("sender address: {e}")))?;
    let derived = chain_eth::address_from_public_key(public_key)
        .map_err(|e| TransferError::InvalidIntent(e.to_string()))?;
    if derived != declared_addr {
        return Err(no_match("EVM", declared));
    }
    Ok((AccountKind::ExternallyOwned, derived))
}

pub fn select_tron_account(
    public_key: &[u8],
    declared: &str,
) -> Result<(AccountKind, TronAddress), TransferError> {
    let declared_addr = TronAddress::parse(declared)
        .map_err(|e| TransferError::InvalidIntent(format!("sender address: {e}")))?;
    let derived = TronAddress::from_public_key(public_key)
        .map_err(|e| TransferError::InvalidIntent(e.to_string()))?;
    if derived != declared_addr {
        return Err(no_match("TRON", declared));
    }
    Ok((AccountKind::ExternallyOwned, derived))
}
