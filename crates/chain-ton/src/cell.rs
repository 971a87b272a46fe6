//! TON cells: the bit-string + references tree every on-chain structure is
//! made of.
//!
//! Only ordinary (level 0) cells are supported, which is all a wallet ever
//! produces. The representation hash follows the TVM rules:
//!
//! ```text
//! repr  = d1 || d2 || padded_data || depth(ref_i) as u16be ... || hash(ref_i) ...
//! d1    = number of refs
//! d2    = floor(bits / 8) + ceil(bits / 8)
//! hash  = sha256(repr)
//! ```
//!
//! When the bit length is not a multiple of 8 the data is padded with a single
//! `1` bit followed by zeros (the "completion tag").

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::address::TonAddress;
use crate::error::TonError;

/// Maximum number of data bits in one cell.
pub const MAX_CELL_BITS: usize = 1023;

/// Maximum number of references in one cell.
pub const MAX_CELL_REFS: usize = 4;

/// Largest value representable as `VarUInteger 16` (15 bytes).
pub const MAX_COINS: u128 = (1u128 << 120) - 1;

/// An immutable ordinary cell with its cached hash and depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
    hash: [u8; 32],
    depth: u16,
}

impl Cell {
    /// Builds a cell from packed bits (MSB first) and child references.
    ///
    /// Bits past `bit_len` in the last byte are cleared.
    pub fn new(mut data: Vec<u8>, bit_len: usize, refs: Vec<Arc<Cell>>) -> Result<Self, TonError> {
        if bit_len > MAX_CELL_BITS {
            return Err(TonError::CellOverflow(format!(
                "{bit_len} bits exceeds the {MAX_CELL_BITS}-bit limit"
            )));
        }
        if refs.len() > MAX_CELL_REFS {
            return Err(TonError::CellOverflow(format!(
                "{} refs exceeds the {MAX_CELL_REFS}-ref limit",
                refs.len()
            )));
        }

        let byte_len = bit_len.div_ceil(8);
        if data.len() != byte_len {
            return Err(TonError::EncodingError(format!(
                "expected {byte_len} data bytes for {bit_len} bits, got {}",
                data.len()
            )));
        }
        if bit_len % 8 != 0 {
            let keep = 0xffu8 << (8 - bit_len % 8);
            if let Some(last) = data.last_mut() {
                *last &= keep;
            }
        }

        let depth = refs
            .iter()
            .map(|r| r.depth.saturating_add(1))
            .max()
            .unwrap_or(0);

        let mut cell = Self {
            data,
            bit_len,
            refs,
            hash: [0u8; 32],
            depth,
        };
        cell.hash = Sha256::digest(cell.representation()).into();
        Ok(cell)
    }

    /// Builds a cell from data that carries the completion tag (BOC layout).
    pub fn from_padded(padded: &[u8], d2: u8, refs: Vec<Arc<Cell>>) -> Result<Self, TonError> {
        let mut data = padded.to_vec();
        let bit_len = if d2 % 2 == 0 {
            data.len() * 8
        } else {
            let last = data.last().copied().unwrap_or(0);
            if last == 0 {
                return Err(TonError::BocError("missing completion tag".into()));
            }
            let tag_pos = last.trailing_zeros() as usize;
            // Drop the tag bit itself.
            if let Some(byte) = data.last_mut() {
                *byte &= !(1u8 << tag_pos);
            }
            data.len() * 8 - tag_pos - 1
        };
        data.truncate(bit_len.div_ceil(8));
        Self::new(data, bit_len, refs)
    }

    /// An empty cell (no bits, no refs).
    pub fn empty() -> Self {
        let mut cell = Self {
            data: Vec::new(),
            bit_len: 0,
            refs: Vec::new(),
            hash: [0u8; 32],
            depth: 0,
        };
        cell.hash = Sha256::digest(cell.representation()).into();
        cell
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Packed data bits without the completion tag.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn refs(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    /// Representation hash.
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// Reference descriptor byte.
    pub fn d1(&self) -> u8 {
        self.refs.len() as u8
    }

    /// Bits descriptor byte.
    pub fn d2(&self) -> u8 {
        (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8
    }

    /// Data bytes with the completion tag applied.
    pub fn padded_data(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.bit_len % 8 != 0 {
            let idx = self.bit_len / 8;
            out[idx] |= 0x80 >> (self.bit_len % 8);
        }
        out
    }

    /// Reads a single bit (0-indexed from the most significant bit).
    pub fn bit(&self, index: usize) -> bool {
        index < self.bit_len && self.data[index / 8] & (0x80 >> (index % 8)) != 0
    }

    fn representation(&self) -> Vec<u8> {
        let mut repr = Vec::with_capacity(2 + self.data.len() + self.refs.len() * 34);
        repr.push(self.d1());
        repr.push(self.d2());
        repr.extend_from_slice(&self.padded_data());
        for r in &self.refs {
            repr.extend_from_slice(&r.depth.to_be_bytes());
        }
        for r in &self.refs {
            repr.extend_from_slice(&r.hash);
        }
        repr
    }
}

/// Incremental cell writer.
///
/// All `store_*` methods return `&mut Self` so calls can be chained with `?`.
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    refs: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn available_bits(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    pub fn available_refs(&self) -> usize {
        MAX_CELL_REFS - self.refs.len()
    }

    fn ensure_bits(&self, bits: usize) -> Result<(), TonError> {
        if bits > self.available_bits() {
            return Err(TonError::CellOverflow(format!(
                "cannot store {bits} bits, only {} available",
                self.available_bits()
            )));
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        let idx = self.bit_len / 8;
        if idx == self.data.len() {
            self.data.push(0);
        }
        if bit {
            self.data[idx] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self, TonError> {
        self.ensure_bits(1)?;
        self.push_bit(bit);
        Ok(self)
    }

    /// Stores `value` as an unsigned big-endian integer of `bits` width.
    pub fn store_uint(&mut self, value: u128, bits: usize) -> Result<&mut Self, TonError> {
        if bits > 128 || (bits < 128 && value >> bits != 0) {
            return Err(TonError::EncodingError(format!(
                "value {value} does not fit in {bits} bits"
            )));
        }
        self.ensure_bits(bits)?;
        for i in (0..bits).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Stores a two's complement 8-bit signed integer.
    pub fn store_i8(&mut self, value: i8) -> Result<&mut Self, TonError> {
        self.store_uint(u128::from(value as u8), 8)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, TonError> {
        self.ensure_bits(bytes.len() * 8)?;
        for &byte in bytes {
            for i in (0..8).rev() {
                self.push_bit((byte >> i) & 1 == 1);
            }
        }
        Ok(self)
    }

    pub fn store_ones(&mut self, count: usize) -> Result<&mut Self, TonError> {
        self.ensure_bits(count)?;
        for _ in 0..count {
            self.push_bit(true);
        }
        Ok(self)
    }

    /// Stores a `VarUInteger 16` amount: 4-bit byte length, then the bytes.
    pub fn store_coins(&mut self, amount: u128) -> Result<&mut Self, TonError> {
        if amount > MAX_COINS {
            return Err(TonError::EncodingError(format!(
                "coin amount {amount} exceeds VarUInteger 16"
            )));
        }
        let byte_len = (128 - amount.leading_zeros() as usize).div_ceil(8);
        self.store_uint(byte_len as u128, 4)?;
        self.store_uint(amount, byte_len * 8)
    }

    /// Stores a `MsgAddress`: `addr_none$00` or `addr_std$10` without anycast.
    pub fn store_address(&mut self, address: Option<&TonAddress>) -> Result<&mut Self, TonError> {
        match address {
            None => self.store_uint(0, 2),
            Some(addr) => {
                self.ensure_bits(267)?;
                self.store_uint(0b10, 2)?;
                self.store_bit(false)?;
                self.store_i8(addr.workchain)?;
                self.store_bytes(&addr.hash)
            }
        }
    }

    pub fn store_ref(&mut self, cell: Arc<Cell>) -> Result<&mut Self, TonError> {
        if self.refs.len() >= MAX_CELL_REFS {
            return Err(TonError::CellOverflow("no reference slots left".into()));
        }
        self.refs.push(cell);
        Ok(self)
    }

    /// Stores `Maybe ^Cell`.
    pub fn store_maybe_ref(&mut self, cell: Option<Arc<Cell>>) -> Result<&mut Self, TonError> {
        match cell {
            Some(c) => {
                self.store_bit(true)?;
                self.store_ref(c)
            }
            None => self.store_bit(false),
        }
    }

    /// Appends the bits and refs of an existing cell.
    pub fn store_cell_contents(&mut self, cell: &Cell) -> Result<&mut Self, TonError> {
        self.ensure_bits(cell.bit_len())?;
        if cell.refs().len() > self.available_refs() {
            return Err(TonError::CellOverflow("too many refs to append".into()));
        }
        for i in 0..cell.bit_len() {
            self.push_bit(cell.bit(i));
        }
        self.refs.extend(cell.refs().iter().cloned());
        Ok(self)
    }

    pub fn build(&self) -> Result<Cell, TonError> {
        Cell::new(self.data.clone(), self.bit_len, self.refs.clone())
    }
}
