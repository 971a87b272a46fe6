use alloy_rlp::{Decodable, Encodable, Header, RlpEncodable};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::address::{address_from_public_key, EthAddress};
use crate::erc20;
use crate::error::EthError;

/// EIP-2718 type byte of a dynamic-fee transaction.
pub const EIP1559_TX_TYPE: u8 = 0x02;

/// An unsigned EIP-1559 (type 2) transaction with an empty access list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub gas_limit: u64,
    pub to: EthAddress,
    /// Transfer value in wei.
    pub value: u128,
    /// Calldata (empty for plain value transfers).
    pub data: Vec<u8>,
}

/// Fee caps for a type-2 transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeCaps {
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
}

impl FeeCaps {
    /// `max_fee = base + priority`, `max_priority = priority`.
    pub fn from_rates(base_fee: u128, priority_fee: u128) -> Self {
        Self {
            max_priority_fee_per_gas: priority_fee,
            max_fee_per_gas: base_fee.saturating_add(priority_fee),
        }
    }
}

impl EthTransaction {
    /// Plain value transfer.
    pub fn native(
        chain_id: u64,
        nonce: u64,
        to: EthAddress,
        value: u128,
        fees: FeeCaps,
        gas_limit: u64,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            max_fee_per_gas: fees.max_fee_per_gas,
            gas_limit,
            to,
            value,
            data: Vec::new(),
        }
    }

    /// ERC-20 `transfer(recipient, amount)` call against `token`.
    pub fn token(
        chain_id: u64,
        nonce: u64,
        token: EthAddress,
        recipient: &EthAddress,
        amount: u128,
        fees: FeeCaps,
        gas_limit: u64,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            max_fee_per_gas: fees.max_fee_per_gas,
            gas_limit,
            to: token,
            value: 0,
            data: erc20::encode_transfer(recipient, amount),
        }
    }

    /// `0x02 || rlp([chain_id, nonce, max_priority, max_fee, gas, to, value, data, []])`.
    pub fn encode_unsigned(&self) -> Vec<u8> {
        let fields = UnsignedTxFields {
            chain_id: self.chain_id,
            nonce: self.nonce,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit: self.gas_limit,
            to: RlpFixedBytes(self.to),
            value: self.value,
            data: RlpBytes(self.data.clone()),
            access_list: EmptyAccessList,
        };
        typed(&fields)
    }

    /// Keccak-256 of the unsigned encoding; the digest the sender signs.
    pub fn signing_hash(&self) -> [u8; 32] {
        Keccak256::digest(self.encode_unsigned()).into()
    }

    /// Parses the output of [`EthTransaction::encode_unsigned`].
    pub fn decode_unsigned(bytes: &[u8]) -> Result<Self, EthError> {
        let (&ty, rest) = bytes
            .split_first()
            .ok_or_else(|| EthError::DecodeError("empty input".into()))?;
        if ty != EIP1559_TX_TYPE {
            return Err(EthError::DecodeError(format!("unexpected type byte 0x{ty:02x}")));
        }

        let mut outer = rest;
        let mut buf = Header::decode_bytes(&mut outer, true).map_err(rlp_err)?;
        if !outer.is_empty() {
            return Err(EthError::DecodeError("trailing bytes after payload".into()));
        }

        let chain_id = u64::decode(&mut buf).map_err(rlp_err)?;
        let nonce = u64::decode(&mut buf).map_err(rlp_err)?;
        let max_priority_fee_per_gas = u128::decode(&mut buf).map_err(rlp_err)?;
        let max_fee_per_gas = u128::decode(&mut buf).map_err(rlp_err)?;
        let gas_limit = u64::decode(&mut buf).map_err(rlp_err)?;
        let to = <[u8; 20]>::decode(&mut buf).map_err(rlp_err)?;
        let value = u128::decode(&mut buf).map_err(rlp_err)?;
        let data = Header::decode_bytes(&mut buf, false).map_err(rlp_err)?.to_vec();
        let access_list = Header::decode_bytes(&mut buf, true).map_err(rlp_err)?;
        if !access_list.is_empty() {
            return Err(EthError::DecodeError("non-empty access list".into()));
        }
        if !buf.is_empty() {
            return Err(EthError::DecodeError("unexpected extra fields".into()));
        }

        Ok(Self {
            chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to,
            value,
            data,
        })
    }

    /// `0x02 || rlp([... unsigned fields ..., y_parity, r, s])`.
    pub fn encode_signed(&self, signature: &EthSignature) -> Vec<u8> {
        let fields = SignedTxFields {
            chain_id: self.chain_id,
            nonce: self.nonce,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            max_fee_per_gas: self.max_fee_per_gas,
            gas_limit: self.gas_limit,
            to: RlpFixedBytes(self.to),
            value: self.value,
            data: RlpBytes(self.data.clone()),
            access_list: EmptyAccessList,
            signature_y_parity: signature.y_parity as u8,
            signature_r: RlpU256(signature.r),
            signature_s: RlpU256(signature.s),
        };
        typed(&fields)
    }

    /// Recovers the account that produced `signature` over this transaction.
    pub fn recover_signer(&self, signature: &EthSignature) -> Result<EthAddress, EthError> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&signature.r);
        rs[32..].copy_from_slice(&signature.s);
        let sig = Signature::from_slice(&rs)
            .map_err(|e| EthError::InvalidSignature(e.to_string()))?;
        let recid = RecoveryId::new(signature.y_parity, false);
        let key = VerifyingKey::recover_from_prehash(&self.signing_hash(), &sig, recid)
            .map_err(|e| EthError::InvalidSignature(e.to_string()))?;
        address_from_public_key(key.to_encoded_point(false).as_bytes())
    }
}

/// Keccak-256 of signed wire bytes, `0x`-prefixed.
pub fn transaction_hash(raw_tx: &[u8]) -> String {
    format!("0x{}", hex::encode(Keccak256::digest(raw_tx)))
}

fn typed<T: Encodable>(fields: &T) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + fields.length());
    out.push(EIP1559_TX_TYPE);
    fields.encode(&mut out);
    out
}

fn rlp_err(e: alloy_rlp::Error) -> EthError {
    EthError::DecodeError(e.to_string())
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// A secp256k1 signature split into the fields a type-2 transaction carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EthSignature {
    pub y_parity: bool,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl EthSignature {
    /// Accepts `r || s || v` (65 bytes, v in {0, 1, 27, 28}) or the EIP-2098
    /// compact `r || vs` (64 bytes, parity in the top bit of `vs`).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EthError> {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        match bytes.len() {
            65 => {
                r.copy_from_slice(&bytes[..32]);
                s.copy_from_slice(&bytes[32..64]);
                let y_parity = match bytes[64] {
                    0 | 27 => false,
                    1 | 28 => true,
                    v => {
                        return Err(EthError::InvalidSignature(format!(
                            "unsupported recovery byte {v}"
                        )))
                    }
                };
                Ok(Self { y_parity, r, s })
            }
            64 => {
                r.copy_from_slice(&bytes[..32]);
                s.copy_from_slice(&bytes[32..]);
                let y_parity = s[0] & 0x80 != 0;
                s[0] &= 0x7f;
                Ok(Self { y_parity, r, s })
            }
            n => Err(EthError::InvalidSignature(format!(
                "expected 64 or 65 bytes, got {n}"
            ))),
        }
    }

    /// EIP-2098 compact form.
    pub fn to_compact(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        if self.y_parity {
            out[32] |= 0x80;
        }
        out
    }
}

// ---------------------------------------------------------------------------
// RLP-encodable structures
// ---------------------------------------------------------------------------

#[derive(RlpEncodable)]
struct UnsignedTxFields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    to: RlpFixedBytes<20>,
    value: u128,
    data: RlpBytes,
    access_list: EmptyAccessList,
}

#[derive(RlpEncodable)]
struct SignedTxFields {
    chain_id: u64,
    nonce: u64,
    max_priority_fee_per_gas: u128,
    max_fee_per_gas: u128,
    gas_limit: u64,
    to: RlpFixedBytes<20>,
    value: u128,
    data: RlpBytes,
    access_list: EmptyAccessList,
    signature_y_parity: u8,
    signature_r: RlpU256,
    signature_s: RlpU256,
}

/// Byte string (as opposed to a list of integers).
struct RlpBytes(Vec<u8>);

impl Encodable for RlpBytes {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.0.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        self.0.as_slice().length()
    }
}

/// Access lists are never populated by the engine.
struct EmptyAccessList;

impl Encodable for EmptyAccessList {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        Header {
            list: true,
            payload_length: 0,
        }
        .encode(out);
    }

    fn length(&self) -> usize {
        1
    }
}

/// 256-bit integer encoded minimally (leading zeros stripped).
struct RlpU256([u8; 32]);

impl RlpU256 {
    fn trimmed(&self) -> &[u8] {
        let start = self.0.iter().position(|&b| b != 0).unwrap_or(32);
        &self.0[start..]
    }
}

impl Encodable for RlpU256 {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.trimmed().encode(out);
    }

    fn length(&self) -> usize {
        self.trimmed().length()
    }
}

struct RlpFixedBytes<const N: usize>([u8; N]);

impl<const N: usize> Encodable for RlpFixedBytes<N> {
    fn encode(&self, out: &mut dyn alloy_rlp::BufMut) {
        self.0.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        self.0.as_slice().length()
    }
}
