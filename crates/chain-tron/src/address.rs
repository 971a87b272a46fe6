//! TRON account addresses.
//!
//! An address is `0x41 || keccak256(pubkey)[12..]`, i.e. the EVM account id
//! behind a one-byte network prefix. The user-facing form is Base58Check
//! (`T...`, 34 chars); nodes also accept the 42-char hex form (`41...`).

use std::fmt;

use chain_eth::{address_from_public_key, EthAddress};

use crate::error::TronError;

/// Mainnet address prefix byte.
pub const ADDRESS_PREFIX: u8 = 0x41;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TronAddress([u8; 21]);

impl TronAddress {
    pub fn from_evm(account: EthAddress) -> Self {
        let mut bytes = [0u8; 21];
        bytes[0] = ADDRESS_PREFIX;
        bytes[1..].copy_from_slice(&account);
        Self(bytes)
    }

    /// Derives the address from a compressed or uncompressed secp256k1 key.
    pub fn from_public_key(public_key: &[u8]) -> Result<Self, TronError> {
        Ok(Self::from_evm(address_from_public_key(public_key)?))
    }

    /// Accepts either the Base58Check or the `41`-prefixed hex form.
    pub fn parse(s: &str) -> Result<Self, TronError> {
        if s.len() == 42 && s.starts_with("41") {
            return Self::parse_hex(s);
        }
        Self::parse_base58(s)
    }

    pub fn parse_base58(s: &str) -> Result<Self, TronError> {
        let decoded = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| TronError::InvalidAddress(format!("invalid base58check: {e}")))?;
        Self::from_bytes(&decoded)
    }

    pub fn parse_hex(s: &str) -> Result<Self, TronError> {
        let decoded =
            hex::decode(s).map_err(|e| TronError::InvalidAddress(format!("invalid hex: {e}")))?;
        Self::from_bytes(&decoded)
    }

    /// Prefixed 21-byte form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TronError> {
        if bytes.len() != 21 {
            return Err(TronError::InvalidAddress(format!(
                "expected 21 bytes, got {}",
                bytes.len()
            )));
        }
        if bytes[0] != ADDRESS_PREFIX {
            return Err(TronError::InvalidAddress(format!(
                "unexpected prefix 0x{:02x}",
                bytes[0]
            )));
        }
        let mut out = [0u8; 21];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn is_address(s: &str) -> bool {
        Self::parse(s).is_ok()
    }

    pub fn as_bytes(&self) -> &[u8; 21] {
        &self.0
    }

    /// The 20-byte account id without the prefix, as used in ABI words.
    pub fn evm_bytes(&self) -> EthAddress {
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.0[1..]);
        out
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).with_check().into_string()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}
