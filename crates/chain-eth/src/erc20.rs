use crate::abi::{encode_function_call, AbiParam};
use crate::address::EthAddress;

/// Canonical signature of the token transfer method.
pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";

/// Function selector for `transfer(address,uint256)`: `0xa9059cbb`.
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Calldata for `transfer(to, amount)`.
pub fn encode_transfer(to: &EthAddress, amount: u128) -> Vec<u8> {
    encode_function_call(
        TRANSFER_SELECTOR,
        &[AbiParam::Address(*to), AbiParam::uint(amount)],
    )
}
