//! Ethereum/EVM chain support for the transfer engine.
//!
//! This crate provides:
//! - Account address derivation from secp256k1 public keys (with EIP-55 checksums)
//! - EIP-1559 transaction encoding, decoding and signature framing
//! - ERC-20 `transfer` calldata
//! - The registry of EVM networks the engine accepts
//! - Static ABI words shared with TRC-20 calls

pub mod abi;
pub mod address;
pub mod chains;
pub mod erc20;
pub mod error;
pub mod transaction;

pub use address::{address_from_public_key, is_address, parse_address, to_checksum, EthAddress};
pub use error::EthError;
pub use transaction::{transaction_hash, EthSignature, EthTransaction, FeeCaps};
