//! Resumable state: the opaque blob returned by `bake` and consumed by `send`.
//!
//! ```text
//! "BAKE" | version:u8 | family:u8 | (tag:u8 | len:u32be | bytes)* | checksum:4
//! ```
//!
//! `checksum` is the first four bytes of SHA-256 over everything before it.
//! Fields must appear in the order the reader asks for them; a reader that
//! finishes with bytes left over rejects the blob.

use sha2::{Digest, Sha256};

use crate::error::TransferError;
use crate::types::ChainFamily;

pub const STATE_MAGIC: &[u8; 4] = b"BAKE";
pub const STATE_VERSION: u8 = 1;

const HEADER_LEN: usize = 6;
const CHECKSUM_LEN: usize = 4;

fn checksum(bytes: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(bytes);
    [digest[0], digest[1], digest[2], digest[3]]
}

fn malformed(msg: impl Into<String>) -> TransferError {
    TransferError::MalformedResumableState(msg.into())
}

/// Builds a state blob field by field.
#[derive(Debug)]
pub struct StateWriter {
    buf: Vec<u8>,
}

impl StateWriter {
    pub fn new(family: ChainFamily) -> Self {
        let mut buf = Vec::with_capacity(256);
        buf.extend_from_slice(STATE_MAGIC);
        buf.push(STATE_VERSION);
        buf.push(family.tag());
        Self { buf }
    }

    pub fn field(mut self, tag: u8, bytes: &[u8]) -> Self {
        self.buf.push(tag);
        self.buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn u128_field(self, tag: u8, value: u128) -> Self {
        self.field(tag, &value.to_be_bytes())
    }

    pub fn finish(mut self) -> Vec<u8> {
        let sum = checksum(&self.buf);
        self.buf.extend_from_slice(&sum);
        self.buf
    }
}

/// Sequential reader over a verified state blob.
#[derive(Debug)]
pub struct StateReader<'a> {
    body: &'a [u8],
    pos: usize,
}

/// Family recorded in a blob, after checking magic, version and checksum.
pub fn peek_family(blob: &[u8]) -> Result<ChainFamily, TransferError> {
    verify_envelope(blob)?;
    ChainFamily::from_tag(blob[5])
        .ok_or_else(|| malformed(format!("unknown family tag {}", blob[5])))
}

fn verify_envelope(blob: &[u8]) -> Result<&[u8], TransferError> {
    if blob.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(malformed(format!("{} bytes is too short", blob.len())));
    }
    if &blob[..4] != STATE_MAGIC {
        return Err(malformed("bad magic"));
    }
    if blob[4] != STATE_VERSION {
        return Err(malformed(format!("unsupported format version {}", blob[4])));
    }
    let (signed, sum) = blob.split_at(blob.len() - CHECKSUM_LEN);
    if checksum(signed) != sum {
        return Err(malformed("checksum mismatch"));
    }
    Ok(&signed[HEADER_LEN..])
}

impl<'a> StateReader<'a> {
    /// Verifies the envelope and that it belongs to `family`.
    pub fn open(blob: &'a [u8], family: ChainFamily) -> Result<Self, TransferError> {
        let found = peek_family(blob)?;
        if found != family {
            return Err(malformed(format!(
                "state belongs to {}, not {}",
                found.display_name(),
                family.display_name()
            )));
        }
        let body = verify_envelope(blob)?;
        Ok(Self { body, pos: 0 })
    }

    /// Next field, which must carry `tag`.
    pub fn field(&mut self, tag: u8) -> Result<&'a [u8], TransferError> {
        let rest = &self.body[self.pos..];
        if rest.len() < 5 {
            return Err(malformed(format!("missing field {tag}")));
        }
        if rest[0] != tag {
            return Err(malformed(format!("expected field {tag}, found {}", rest[0])));
        }
        let len = u32::from_be_bytes([rest[1], rest[2], rest[3], rest[4]]) as usize;
        let value = rest
            .get(5..5 + len)
            .ok_or_else(|| malformed(format!("field {tag} overruns the blob")))?;
        self.pos += 5 + len;
        Ok(value)
    }

    /// Next field as a fixed-size array.
    pub fn array<const N: usize>(&mut self, tag: u8) -> Result<[u8; N], TransferError> {
        let bytes = self.field(tag)?;
        bytes
            .try_into()
            .map_err(|_| malformed(format!("field {tag} must be {N} bytes, got {}", bytes.len())))
    }

    pub fn u128_field(&mut self, tag: u8) -> Result<u128, TransferError> {
        Ok(u128::from_be_bytes(self.array::<16>(tag)?))
    }

    /// Fails if unread fields remain.
    pub fn finish(self) -> Result<(), TransferError> {
        if self.pos != self.body.len() {
            return Err(malformed(format!(
                "{} trailing bytes",
                self.body.len() - self.pos
            )));
        }
        Ok(())
    }
}
