use std::fmt;

use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use crc::{Crc, CRC_16_XMODEM};

use crate::error::TonError;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// A standard (`addr_std`) TON address: workchain plus 256-bit account id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TonAddress {
    pub workchain: i8,
    pub hash: [u8; 32],
}

/// Flags carried by the user-friendly encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendlyAddress {
    pub address: TonAddress,
    pub bounceable: bool,
    pub test_only: bool,
}

impl TonAddress {
    pub fn new(workchain: i8, hash: [u8; 32]) -> Self {
        Self { workchain, hash }
    }

    /// `true` for the `workchain:64-hex` form.
    pub fn is_raw(s: &str) -> bool {
        Self::parse_raw(s).is_ok()
    }

    /// `true` for the 48-character base64 / base64url form with a valid checksum.
    pub fn is_friendly(s: &str) -> bool {
        Self::parse_friendly(s).is_ok()
    }

    /// Parses `workchain:hex`, e.g. `0:83df...`.
    pub fn parse_raw(s: &str) -> Result<Self, TonError> {
        let (wc, hash_hex) = s
            .split_once(':')
            .ok_or_else(|| TonError::InvalidAddress(format!("missing ':' in {s}")))?;
        let workchain: i8 = wc
            .parse()
            .map_err(|_| TonError::InvalidAddress(format!("bad workchain {wc}")))?;
        if hash_hex.len() != 64 {
            return Err(TonError::InvalidAddress(format!(
                "account id must be 64 hex chars, got {}",
                hash_hex.len()
            )));
        }
        let bytes = hex::decode(hash_hex)
            .map_err(|e| TonError::InvalidAddress(format!("bad hex: {e}")))?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Self { workchain, hash })
    }

    /// Parses the user-friendly form in either base64 alphabet.
    pub fn parse_friendly(s: &str) -> Result<FriendlyAddress, TonError> {
        if s.len() != 48 {
            return Err(TonError::InvalidAddress(format!(
                "friendly address must be 48 chars, got {}",
                s.len()
            )));
        }
        let url_safe = s.contains('-') || s.contains('_');
        let engine = if url_safe { &URL_SAFE } else { &STANDARD };
        let bytes = engine
            .decode(s)
            .map_err(|e| TonError::InvalidAddress(format!("bad base64: {e}")))?;
        if bytes.len() != 36 {
            return Err(TonError::InvalidAddress(format!(
                "expected 36 decoded bytes, got {}",
                bytes.len()
            )));
        }

        let expected = u16::from_be_bytes([bytes[34], bytes[35]]);
        if CRC16.checksum(&bytes[..34]) != expected {
            return Err(TonError::InvalidAddress("checksum mismatch".into()));
        }

        let mut tag = bytes[0];
        let test_only = tag & TAG_TEST_ONLY != 0;
        if test_only {
            tag ^= TAG_TEST_ONLY;
        }
        let bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            other => {
                return Err(TonError::InvalidAddress(format!("unknown tag 0x{other:02x}")))
            }
        };

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[2..34]);
        Ok(FriendlyAddress {
            address: Self {
                workchain: bytes[1] as i8,
                hash,
            },
            bounceable,
            test_only,
        })
    }

    pub fn to_raw_string(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash))
    }

    /// Encodes the 36-byte tagged form.
    pub fn to_friendly(&self, bounceable: bool, test_only: bool, url_safe: bool) -> String {
        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if test_only {
            tag |= TAG_TEST_ONLY;
        }

        let mut bytes = Vec::with_capacity(36);
        bytes.push(tag);
        bytes.push(self.workchain as u8);
        bytes.extend_from_slice(&self.hash);
        let crc = CRC16.checksum(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());

        if url_safe {
            URL_SAFE.encode(bytes)
        } else {
            STANDARD.encode(bytes)
        }
    }
}

impl fmt::Display for TonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_friendly(true, false, true))
    }
}
