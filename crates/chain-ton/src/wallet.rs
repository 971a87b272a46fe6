//! Standard wallet contracts: code, initial data and signing-body layout.

use std::sync::Arc;

use crate::address::TonAddress;
use crate::boc;
use crate::cell::{Cell, CellBuilder};
use crate::error::TonError;

/// Base subwallet id; the workchain is added to it.
pub const DEFAULT_WALLET_ID: u32 = 698_983_191;

/// `valid_until` used while the wallet has never sent (seqno 0).
pub const NO_EXPIRY: u32 = u32::MAX;

const WALLET_V3R2_CODE: &str = "B5EE9C724101010100710000DEFF0020DD2082014C97BA218201339CBAB19F71B0ED44D0D31FD31F31D70BFFE304E0A4F2608308D71820D31FD31FD31FF82313BBF263ED44D0D31FD31FD3FFD15132BAF2A15144BAF2A204F901541055F910F2A3F8009320D74A96D307D402FB00E8D101A4C8CB1FCB1FCBFFC9ED5410BD6DAD";

const WALLET_V4R2_CODE: &str = "B5EE9C72410214010002D4000114FF00F4A413F4BCF2C80B010201200203020148040504F8F28308D71820D31FD31FD31F02F823BBF264ED44D0D31FD31FD3FFF404D15143BAF2A15151BAF2A205F901541064F910F2A3F80024A4C8CB1F5240CB1F5230CBFF5210F400C9ED54F80F01D30721C0009F6C519320D74A96D307D402FB00E830E021C001E30021C002E30001C0039130E30D03A4C8CB1F12CB1FCBFF1011121302E6D001D0D3032171B0925F04E022D749C120925F04E002D31F218210706C7567BD22821064737472BDB0925F05E003FA403020FA4401C8CA07CBFFC9D0ED44D0810140D721F404305C810108F40A6FA131B3925F07E005D33FC8258210706C7567BA923830E30D03821064737472BA925F06E30D06070201200809007801FA00F40430F8276F2230500AA121BEF2E0508210706C7567831EB17080185004CB0526CF1658FA0219F400CB6917CB1F5260CB3F20C98040FB0006008A5004810108F45930ED44D0810140D720C801CF16F400C9ED540172B08E23821064737472831EB17080185005CB055003CF1623FA0213CB6ACB1FCB3FC98040FB00925F03E20201200A0B0059BD242B6F6A2684080A06B90FA0218470D4080847A4937D29910CE6903E9FF9837812801B7810148987159F31840201580C0D0011B8C97ED44D0D70B1F8003DB29DFB513420405035C87D010C00B23281F2FFF274006040423D029BE84C600201200E0F0019ADCE76A26840206B90EB85FFC00019AF1DF6A26840106B90EB858FC0006ED207FA00D4D422F90005C8CA0715CBFFC9D077748018C8CB05CB0222CF165005FA0214CB6B12CCCCC973FB00C84014810108F451F2A7020070810108D718FA00D33FC8542047810108F451F2A782106E6F746570748018C8CB05CB025006CF165004FA0214CB6A12CB1FCB3FC973FB0002006C810108D718FA00D33F305224810108F459F2A782106473747270748018C8CB05CB025005CF165003FA0213CB6ACB1F12CB3FC973FB00000AF400C9ED54696225E5";

/// Supported wallet contract revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletVersion {
    V3R2,
    V4R2,
}

impl WalletVersion {
    /// Detection order: newest first.
    pub const PRIORITY: [WalletVersion; 2] = [WalletVersion::V4R2, WalletVersion::V3R2];

    pub fn name(&self) -> &'static str {
        match self {
            WalletVersion::V3R2 => "v3r2",
            WalletVersion::V4R2 => "v4r2",
        }
    }

    /// Stable byte used when persisting the version.
    pub fn tag(&self) -> u8 {
        match self {
            WalletVersion::V3R2 => 0x32,
            WalletVersion::V4R2 => 0x42,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x32 => Some(WalletVersion::V3R2),
            0x42 => Some(WalletVersion::V4R2),
            _ => None,
        }
    }

    /// The contract code cell.
    pub fn code(&self) -> Result<Arc<Cell>, TonError> {
        let hex_boc = match self {
            WalletVersion::V3R2 => WALLET_V3R2_CODE,
            WalletVersion::V4R2 => WALLET_V4R2_CODE,
        };
        let bytes = hex::decode(hex_boc)
            .map_err(|e| TonError::BocError(format!("wallet code hex: {e}")))?;
        boc::deserialize(&bytes)
    }

    /// Subwallet id for the given workchain.
    pub fn wallet_id(workchain: i8) -> u32 {
        DEFAULT_WALLET_ID.wrapping_add_signed(i32::from(workchain))
    }

    /// Persistent data of a freshly deployed wallet.
    pub fn initial_data(&self, public_key: &[u8; 32], workchain: i8) -> Result<Cell, TonError> {
        let mut b = CellBuilder::new();
        b.store_uint(0, 32)?
            .store_uint(u128::from(Self::wallet_id(workchain)), 32)?
            .store_bytes(public_key)?;
        if *self == WalletVersion::V4R2 {
            // empty plugin dictionary
            b.store_bit(false)?;
        }
        b.build()
    }

    /// `StateInit { code, data }` with no split depth, special flags or libraries.
    pub fn state_init(&self, public_key: &[u8; 32], workchain: i8) -> Result<Cell, TonError> {
        let code = self.code()?;
        let data = Arc::new(self.initial_data(public_key, workchain)?);
        let mut b = CellBuilder::new();
        b.store_bit(false)?
            .store_bit(false)?
            .store_maybe_ref(Some(code))?
            .store_maybe_ref(Some(data))?
            .store_bit(false)?;
        b.build()
    }

    /// Contract address implied by the public key.
    pub fn derive_address(
        &self,
        public_key: &[u8; 32],
        workchain: i8,
    ) -> Result<TonAddress, TonError> {
        let init = self.state_init(public_key, workchain)?;
        Ok(TonAddress::new(workchain, init.hash()))
    }

    /// Body the owner signs: header fields then one `(mode, ^message)` pair per message.
    pub fn build_signing_body(
        &self,
        wallet_id: u32,
        valid_until: u32,
        seqno: u32,
        messages: &[(u8, Arc<Cell>)],
    ) -> Result<Cell, TonError> {
        if messages.len() > 4 {
            return Err(TonError::CellOverflow(format!(
                "a wallet body carries at most 4 messages, got {}",
                messages.len()
            )));
        }
        let mut b = CellBuilder::new();
        b.store_uint(u128::from(wallet_id), 32)?
            .store_uint(u128::from(valid_until), 32)?
            .store_uint(u128::from(seqno), 32)?;
        if *self == WalletVersion::V4R2 {
            // op 0: simple send
            b.store_uint(0, 8)?;
        }
        for (mode, message) in messages {
            b.store_uint(u128::from(*mode), 8)?.store_ref(message.clone())?;
        }
        b.build()
    }

    /// Expiry for a body signed at `now`.
    pub fn valid_until(seqno: u32, now: u64, ttl_secs: u64) -> u32 {
        if seqno == 0 {
            NO_EXPIRY
        } else {
            u32::try_from(now.saturating_add(ttl_secs)).unwrap_or(NO_EXPIRY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, b) in key.iter_mut().enumerate() {
            *b = i as u8 + 1;
        }
        key
    }

    #[test]
    fn code_hashes_match_published_contracts() {
        assert_eq!(
            hex::encode(WalletVersion::V3R2.code().unwrap().hash()),
            "84dafa449f98a6987789ba232358072bc0f76dc4524002a5d0918b9a75d2d599"
        );
        let v4 = WalletVersion::V4R2.code().unwrap();
        assert_eq!(
            hex::encode(v4.hash()),
            "feb5ff6820e2ff0d9483e7e0d62c817d846789fb4ae580c878866d959dabd5c0"
        );
        assert_eq!(v4.depth(), 7);
    }

    #[test]
    fn wallet_id_adds_workchain() {
        assert_eq!(WalletVersion::wallet_id(0), 698_983_191);
        assert_eq!(WalletVersion::wallet_id(-1), 698_983_190);
    }

    #[test]
    fn v3r2_address_from_known_key() {
        let addr = WalletVersion::V3R2.derive_address(&sample_key(), 0).unwrap();
        assert_eq!(
            addr.to_raw_string(),
            "0:1e6545973bc758e37bfc679121ebf6faed62520efa693df86ed1fb8b6e2a5025"
        );
    }

    #[test]
    fn v4r2_address_from_known_key() {
        let addr = WalletVersion::V4R2.derive_address(&sample_key(), 0).unwrap();
        assert_eq!(
            addr.to_raw_string(),
            "0:d37e20bf219e3263ed8a3110446f2a52d96ff36c0e1b08bbbb1bdfe8031e9a9a"
        );
    }

    #[test]
    fn priority_puts_v4r2_first() {
        assert_eq!(WalletVersion::PRIORITY[0], WalletVersion::V4R2);
        assert_eq!(WalletVersion::PRIORITY[1], WalletVersion::V3R2);
    }

    #[test]
    fn tag_roundtrip() {
        for v in WalletVersion::PRIORITY {
            assert_eq!(WalletVersion::from_tag(v.tag()), Some(v));
        }
        assert_eq!(WalletVersion::from_tag(0), None);
    }

    #[test]
    fn v4r2_body_has_op_byte() {
        let msg = Arc::new(Cell::empty());
        let v3 = WalletVersion::V3R2
            .build_signing_body(1, 2, 3, &[(3, msg.clone())])
            .unwrap();
        let v4 = WalletVersion::V4R2
            .build_signing_body(1, 2, 3, &[(3, msg)])
            .unwrap();
        assert_eq!(v3.bit_len(), 32 * 3 + 8);
        assert_eq!(v4.bit_len(), 32 * 3 + 8 + 8);
        assert_eq!(v3.refs().len(), 1);
    }

    #[test]
    fn body_rejects_five_messages() {
        let msg = Arc::new(Cell::empty());
        let msgs: Vec<_> = (0..5).map(|_| (3u8, msg.clone())).collect();
        assert!(WalletVersion::V3R2.build_signing_body(1, 2, 3, &msgs).is_err());
    }

    #[test]
    fn valid_until_for_fresh_wallet_never_expires() {
        assert_eq!(WalletVersion::valid_until(0, 1_700_000_000, 60), NO_EXPIRY);
        assert_eq!(WalletVersion::valid_until(5, 1_700_000_000, 60), 1_700_000_060);
    }
}
