//! TON chain support for the transfer engine.
//!
//! This crate provides:
//! - Ordinary cells with representation hashes, and bag-of-cells serialization
//! - Raw and user-friendly (base64 / base64url, CRC16) address handling
//! - Wallet v3r2 / v4r2 contract code, address derivation and signing bodies
//! - Internal, external, jetton-transfer and text-comment message builders
//!
//! Everything is implemented directly on `sha2`, `crc` and `base64`; no TVM
//! or node code is involved.

pub mod address;
pub mod boc;
pub mod cell;
pub mod error;
pub mod message;
pub mod wallet;

pub use address::{FriendlyAddress, TonAddress};
pub use cell::{Cell, CellBuilder, MAX_COINS};
pub use error::TonError;
pub use message::{
    comment_body, external_message, jetton_transfer_body, sign_body, InternalMessage,
    SEND_MODE_IGNORE_ERRORS, SEND_MODE_PAY_GAS_SEPARATELY,
};
pub use wallet::{WalletVersion, DEFAULT_WALLET_ID, NO_EXPIRY};
