use sha2::{Digest, Sha256};

use chain_eth::abi::{encode_params, AbiParam};

use crate::address::TronAddress;
use crate::error::TronError;

/// Energy price (sun per unit) used when the node reports nothing usable.
pub const DEFAULT_ENERGY_PRICE: u64 = 420;

/// Protobuf tags of `Transaction.raw_data` (field 1) and `Transaction.signature` (field 2),
/// both length-delimited.
const RAW_DATA_TAG: u8 = (1 << 3) | 2;
const SIGNATURE_TAG: u8 = (2 << 3) | 2;

// ---------------------------------------------------------------------------
// Transaction id
// ---------------------------------------------------------------------------

/// The txID: SHA-256 of the serialized `raw_data`.
pub fn transaction_id(raw_data: &[u8]) -> [u8; 32] {
    Sha256::digest(raw_data).into()
}

/// Checks a node-supplied txID against the `raw_data` it came with.
pub fn verify_transaction_id(raw_data: &[u8], claimed_hex: &str) -> Result<[u8; 32], TronError> {
    let id = transaction_id(raw_data);
    let claimed = hex::decode(claimed_hex.trim_start_matches("0x")).map_err(|e| {
        TronError::TransactionIdMismatch(format!("unparsable id {claimed_hex}: {e}"))
    })?;
    if claimed != id {
        return Err(TronError::TransactionIdMismatch(format!(
            "node returned {claimed_hex}, raw_data hashes to {}",
            hex::encode(id)
        )));
    }
    Ok(id)
}

// ---------------------------------------------------------------------------
// Varint
// ---------------------------------------------------------------------------

/// Protobuf base-128 varint.
pub fn encode_varint(value: u64) -> Vec<u8> {
    let mut val = value;
    let mut out = Vec::with_capacity(10);
    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }
    out
}

/// Returns `(value, bytes_consumed)`.
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize), TronError> {
    let mut value = 0u64;
    for (i, &byte) in data.iter().enumerate().take(10) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(TronError::EncodingError("truncated or oversized varint".into()))
}

// ---------------------------------------------------------------------------
// Signed transaction framing
// ---------------------------------------------------------------------------

fn push_field(out: &mut Vec<u8>, tag: u8, bytes: &[u8]) {
    out.push(tag);
    out.extend_from_slice(&encode_varint(bytes.len() as u64));
    out.extend_from_slice(bytes);
}

/// Serializes `Transaction { raw_data, signature* }`.
pub fn encode_signed_transaction(raw_data: &[u8], signatures: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw_data.len() + signatures.len() * 67 + 4);
    push_field(&mut out, RAW_DATA_TAG, raw_data);
    for sig in signatures {
        push_field(&mut out, SIGNATURE_TAG, sig);
    }
    out
}

/// Inverse of [`encode_signed_transaction`]; unknown fields are rejected.
pub fn decode_signed_transaction(bytes: &[u8]) -> Result<(Vec<u8>, Vec<Vec<u8>>), TronError> {
    let mut raw_data = None;
    let mut signatures = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let tag = bytes[pos];
        pos += 1;
        let (len, used) = decode_varint(&bytes[pos..])?;
        pos += used;
        let end = pos
            .checked_add(len as usize)
            .filter(|&e| e <= bytes.len())
            .ok_or_else(|| TronError::EncodingError("field runs past end of input".into()))?;
        let field = bytes[pos..end].to_vec();
        pos = end;
        match tag {
            RAW_DATA_TAG if raw_data.is_none() => raw_data = Some(field),
            SIGNATURE_TAG => signatures.push(field),
            other => {
                return Err(TronError::EncodingError(format!("unexpected tag 0x{other:02x}")))
            }
        }
    }
    let raw_data = raw_data.ok_or_else(|| TronError::EncodingError("missing raw_data".into()))?;
    Ok((raw_data, signatures))
}

// ---------------------------------------------------------------------------
// TRC-20 and energy
// ---------------------------------------------------------------------------

/// Hex `parameter` for `triggersmartcontract` calling `transfer(address,uint256)`.
pub fn trc20_transfer_parameter(to: &TronAddress, amount: u128) -> String {
    hex::encode(encode_params(&[
        AbiParam::Address(to.evm_bytes()),
        AbiParam::uint(amount),
    ]))
}

/// Current energy price from a `getenergyprices` string (`"ts:price,ts:price,..."`).
///
/// The last entry wins; anything unparsable or zero yields `default`.
pub fn parse_energy_price(prices: Option<&str>, default: u64) -> u64 {
    prices
        .and_then(|p| p.split(',').next_back())
        .and_then(|entry| {
            let (_, price) = entry.split_once(':')?;
            if price.contains(':') {
                return None;
            }
            price.trim().parse::<u64>().ok()
        })
        .filter(|&p| p > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_known_encodings() {
        assert_eq!(encode_varint(0), vec![0x00]);
        assert_eq!(encode_varint(127), vec![0x7f]);
        assert_eq!(encode_varint(128), vec![0x80, 0x01]);
        assert_eq!(encode_varint(300), vec![0xac, 0x02]);
    }

    #[test]
    fn varint_decode_reports_consumed() {
        assert_eq!(decode_varint(&[0xac, 0x02, 0xff]).unwrap(), (300, 2));
        assert!(decode_varint(&[0x80]).is_err());
    }

    #[test]
    fn transaction_id_is_sha256_of_raw_data() {
        let raw = hex::decode("0a0207902208e1b9de559665c6714080c49789bb2c").unwrap();
        let id = transaction_id(&raw);
        assert_eq!(id.to_vec(), Sha256::digest(&raw).to_vec());
        assert!(verify_transaction_id(&raw, &hex::encode(id)).is_ok());
    }

    #[test]
    fn verify_rejects_mismatched_id() {
        let err = verify_transaction_id(b"raw", &"00".repeat(32)).unwrap_err();
        assert!(matches!(err, TronError::TransactionIdMismatch(_)));
        assert!(verify_transaction_id(b"raw", "zz").is_err());
    }

    #[test]
    fn signed_transaction_layout() {
        let raw = vec![0xaa; 3];
        let sig = vec![0xbb; 65];
        let wire = encode_signed_transaction(&raw, &[&sig]);
        assert_eq!(&wire[..5], &[0x0a, 0x03, 0xaa, 0xaa, 0xaa]);
        assert_eq!(&wire[5..7], &[0x12, 0x41]);
        assert_eq!(wire.len(), 7 + 65);
    }

    #[test]
    fn signed_transaction_decodes_back() {
        let raw = vec![0x11; 200];
        let sig = vec![0x22; 65];
        let wire = encode_signed_transaction(&raw, &[&sig]);
        let (r, sigs) = decode_signed_transaction(&wire).unwrap();
        assert_eq!(r, raw);
        assert_eq!(sigs, vec![sig]);
    }

    #[test]
    fn decode_rejects_missing_raw_data() {
        let wire = [0x12, 0x01, 0x00];
        assert!(decode_signed_transaction(&wire).is_err());
    }

    #[test]
    fn trc20_parameter_drops_network_prefix() {
        let to = TronAddress::parse("41a614f803b6fd780986a42c78ec9c7f77e6ded13c").unwrap();
        let param = trc20_transfer_parameter(&to, 1_000_000);
        assert_eq!(param.len(), 128);
        assert_eq!(
            &param[..64],
            "000000000000000000000000a614f803b6fd780986a42c78ec9c7f77e6ded13c"
        );
        assert!(param.ends_with("0f4240"));
    }

    #[test]
    fn energy_price_takes_last_entry() {
        let prices = "0:100,1575871200000:10,1606537680000:420,1700000000000:210";
        assert_eq!(parse_energy_price(Some(prices), 420), 210);
    }

    #[test]
    fn energy_price_falls_back_to_default() {
        assert_eq!(parse_energy_price(None, 420), 420);
        assert_eq!(parse_energy_price(Some(""), 420), 420);
        assert_eq!(parse_energy_price(Some("0:abc"), 420), 420);
        assert_eq!(parse_energy_price(Some("0:1:2"), 420), 420);
        assert_eq!(parse_energy_price(Some("0:0"), 420), 420);
    }
}
