use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::{EncodedPoint, PublicKey};
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// A raw 20-byte account address.
pub type EthAddress = [u8; 20];

/// Derives the account address from a secp256k1 public key.
///
/// Accepts SEC1 compressed (33 bytes) or uncompressed (65 bytes) encodings.
/// The address is the last 20 bytes of Keccak-256 over the 64-byte `x || y`.
pub fn address_from_public_key(public_key: &[u8]) -> Result<EthAddress, EthError> {
    let uncompressed = uncompressed_public_key(public_key)?;
    let hash = Keccak256::digest(&uncompressed[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    Ok(addr)
}

/// Normalises a SEC1 public key to its 65-byte uncompressed form.
pub fn uncompressed_public_key(public_key: &[u8]) -> Result<[u8; 65], EthError> {
    if public_key.len() != 33 && public_key.len() != 65 {
        return Err(EthError::InvalidPublicKey(format!(
            "expected 33 or 65 bytes, got {}",
            public_key.len()
        )));
    }

    let encoded = EncodedPoint::from_bytes(public_key)
        .map_err(|e| EthError::InvalidPublicKey(format!("invalid SEC1 encoding: {e}")))?;
    let pubkey: Option<PublicKey> = PublicKey::from_encoded_point(&encoded).into();
    let pubkey = pubkey
        .ok_or_else(|| EthError::InvalidPublicKey("point is not on the secp256k1 curve".into()))?;

    let point = pubkey.to_encoded_point(false);
    let mut out = [0u8; 65];
    out.copy_from_slice(point.as_bytes());
    Ok(out)
}

/// Parses a `0x`-prefixed hex address.
///
/// All-lowercase and all-uppercase forms are accepted as-is; mixed case must
/// carry a valid EIP-55 checksum.
pub fn parse_address(address: &str) -> Result<EthAddress, EthError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_part.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_part.len()
        )));
    }

    let bytes = hex::decode(hex_part)
        .map_err(|_| EthError::InvalidAddress("address contains non-hex characters".into()))?;
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes);

    let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&addr)[2..] != *hex_part {
        return Err(EthError::InvalidAddress(format!(
            "EIP-55 checksum mismatch for {address}"
        )));
    }

    Ok(addr)
}

/// `true` if [`parse_address`] would accept the string.
pub fn is_address(address: &str) -> bool {
    parse_address(address).is_ok()
}

/// EIP-55 mixed-case rendering of an address.
pub fn to_checksum(address: &EthAddress) -> String {
    let lower = hex::encode(address);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
