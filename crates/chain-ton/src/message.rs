//! Message construction: internal transfers, jetton bodies, text comments and
//! the external-in envelope that carries a signed wallet body.

use std::sync::Arc;

use crate::address::TonAddress;
use crate::cell::{Cell, CellBuilder, MAX_CELL_BITS, MAX_CELL_REFS};
use crate::error::TonError;

/// `transfer` op of the jetton wallet standard (TEP-74).
pub const JETTON_TRANSFER_OP: u32 = 0x0f8a_7ea5;

/// Pay forwarding fees separately from the value.
pub const SEND_MODE_PAY_GAS_SEPARATELY: u8 = 1;
/// Skip the action instead of failing the whole transaction.
pub const SEND_MODE_IGNORE_ERRORS: u8 = 2;

/// An outgoing internal message (`int_msg_info` with zeroed fees and timestamps).
#[derive(Debug, Clone)]
pub struct InternalMessage {
    pub bounce: bool,
    pub destination: TonAddress,
    pub value: u128,
    pub body: Option<Cell>,
}

impl InternalMessage {
    pub fn to_cell(&self) -> Result<Cell, TonError> {
        let mut b = CellBuilder::new();
        b.store_bit(false)? // int_msg_info$0
            .store_bit(true)? // ihr_disabled
            .store_bit(self.bounce)?
            .store_bit(false)? // bounced
            .store_address(None)?
            .store_address(Some(&self.destination))?
            .store_coins(self.value)?
            .store_bit(false)? // no extra currencies
            .store_coins(0)? // ihr_fee
            .store_coins(0)? // fwd_fee
            .store_uint(0, 64)? // created_lt
            .store_uint(0, 32)? // created_at
            .store_bit(false)?; // no init

        let body = self.body.clone().unwrap_or_else(Cell::empty);
        store_body(&mut b, &body)?;
        b.build()
    }
}

/// `Either X ^X` for the body: inline when it fits.
fn store_body(b: &mut CellBuilder, body: &Cell) -> Result<(), TonError> {
    let as_ref = b.available_bits().saturating_sub(1) < body.bit_len()
        || b.ref_count() + body.refs().len() > MAX_CELL_REFS;
    if as_ref {
        b.store_bit(true)?.store_ref(Arc::new(body.clone()))?;
    } else {
        b.store_bit(false)?.store_cell_contents(body)?;
    }
    Ok(())
}

/// Text comment: `op = 0` followed by UTF-8 bytes, continued through refs.
pub fn comment_body(text: &str) -> Result<Cell, TonError> {
    let bytes = text.as_bytes();
    let first_cap = (MAX_CELL_BITS - 32) / 8;
    let (head, tail) = bytes.split_at(bytes.len().min(first_cap));

    let mut b = CellBuilder::new();
    b.store_uint(0, 32)?.store_bytes(head)?;
    if !tail.is_empty() {
        b.store_ref(Arc::new(string_tail(tail)?))?;
    }
    b.build()
}

fn string_tail(bytes: &[u8]) -> Result<Cell, TonError> {
    let cap = MAX_CELL_BITS / 8;
    let (head, rest) = bytes.split_at(bytes.len().min(cap));
    let mut b = CellBuilder::new();
    b.store_bytes(head)?;
    if !rest.is_empty() {
        b.store_ref(Arc::new(string_tail(rest)?))?;
    }
    b.build()
}

/// Jetton `transfer` body sent to the sender's own jetton wallet.
///
/// `forward_payload` (usually a comment cell) travels by reference.
pub fn jetton_transfer_body(
    amount: u128,
    destination: &TonAddress,
    response_destination: &TonAddress,
    forward_amount: u128,
    forward_payload: Option<Cell>,
) -> Result<Cell, TonError> {
    let mut b = CellBuilder::new();
    b.store_uint(u128::from(JETTON_TRANSFER_OP), 32)?
        .store_uint(0, 64)? // query_id
        .store_coins(amount)?
        .store_address(Some(destination))?
        .store_address(Some(response_destination))?
        .store_maybe_ref(None)? // custom_payload
        .store_coins(forward_amount)?;
    match forward_payload {
        Some(payload) => b.store_bit(true)?.store_ref(Arc::new(payload))?,
        None => b.store_bit(false)?,
    };
    b.build()
}

/// Prepends a 64-byte signature to a wallet signing body.
pub fn sign_body(signature: &[u8; 64], body: &Cell) -> Result<Cell, TonError> {
    let mut b = CellBuilder::new();
    b.store_bytes(signature)?.store_cell_contents(body)?;
    b.build()
}

/// External-in message delivering `body` to `destination`, with an optional StateInit.
pub fn external_message(
    destination: &TonAddress,
    state_init: Option<&Cell>,
    body: &Cell,
) -> Result<Cell, TonError> {
    let mut b = CellBuilder::new();
    b.store_uint(0b10, 2)? // ext_in_msg_info$10
        .store_address(None)?
        .store_address(Some(destination))?
        .store_coins(0)?; // import_fee

    match state_init {
        Some(init) => {
            b.store_bit(true)?;
            let as_ref = b.available_bits().saturating_sub(2) < init.bit_len() + body.bit_len();
            if as_ref {
                b.store_bit(true)?.store_ref(Arc::new(init.clone()))?;
            } else {
                b.store_bit(false)?.store_cell_contents(init)?;
            }
        }
        None => {
            b.store_bit(false)?;
        }
    }

    store_body(&mut b, body)?;
    b.build()
}
