//! Static ABI words for contract calls.
//!
//! Only the two static types an ERC-20 / TRC-20 transfer needs are supported.

/// A single ABI-encoded parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiParam {
    /// A 20-byte address, left-padded to 32 bytes.
    Address([u8; 20]),
    /// A 256-bit unsigned integer as a big-endian 32-byte array.
    Uint256([u8; 32]),
}

impl AbiParam {
    /// `uint256` from a native amount.
    pub fn uint(value: u128) -> Self {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&value.to_be_bytes());
        AbiParam::Uint256(word)
    }

    /// The 32-byte word for this parameter.
    pub fn word(&self) -> [u8; 32] {
        match self {
            AbiParam::Address(addr) => {
                let mut word = [0u8; 32];
                word[12..].copy_from_slice(addr);
                word
            }
            AbiParam::Uint256(value) => *value,
        }
    }
}

/// Concatenates the parameter words without a selector.
///
/// TRON's `triggersmartcontract` takes the arguments and the selector separately.
pub fn encode_params(params: &[AbiParam]) -> Vec<u8> {
    params.iter().flat_map(|p| p.word()).collect()
}

/// `selector || encode(params[0]) || encode(params[1]) || ...`
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + params.len() * 32);
    data.extend_from_slice(&selector);
    data.extend_from_slice(&encode_params(params));
    data
}
