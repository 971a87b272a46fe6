//! TRON chain support for the transfer engine.
//!
//! TRON transactions are assembled by the node (`createtransaction`,
//! `transferasset`, `triggersmartcontract`), so this crate only covers what the
//! engine must do locally: address handling, txID verification, TRC-20 call
//! parameters, energy-price parsing and the protobuf framing of the signed
//! transaction handed to `broadcasthex`.

pub mod address;
pub mod error;
pub mod transaction;

pub use address::{TronAddress, ADDRESS_PREFIX};
pub use error::TronError;
pub use transaction::{
    encode_signed_transaction, parse_energy_price, transaction_id, trc20_transfer_parameter,
    verify_transaction_id, DEFAULT_ENERGY_PRICE,
};
