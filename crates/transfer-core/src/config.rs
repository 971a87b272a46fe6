//! Engine configuration, loaded from TOML.
//!
//! Every section and field is optional; omitted values take the defaults below.
//!
//! ```toml
//! [ton]
//! message_ttl_secs = 60
//! jetton_transfer_value = 640000000
//! jetton_forward_value = 1
//! send_mode = 3
//!
//! [evm]
//! chain_id = 1
//! native_gas_limit = 21000
//! token_gas_limit = 65000
//!
//! [tron]
//! fee_limit = 100000000
//! default_energy_price = 420
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TransferError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ton: TonConfig,
    pub evm: EvmConfig,
    pub tron: TronConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TonConfig {
    /// Lifetime of a signed body once the wallet has a non-zero seqno.
    pub message_ttl_secs: u64,
    /// Nanotons attached to a jetton transfer to pay for its execution.
    pub jetton_transfer_value: u128,
    /// Nanotons forwarded to the recipient with the transfer notification.
    pub jetton_forward_value: u128,
    pub send_mode: u8,
}

impl Default for TonConfig {
    fn default() -> Self {
        Self {
            message_ttl_secs: 60,
            jetton_transfer_value: 640_000_000,
            jetton_forward_value: 1,
            send_mode: chain_ton::SEND_MODE_PAY_GAS_SEPARATELY | chain_ton::SEND_MODE_IGNORE_ERRORS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvmConfig {
    pub chain_id: u64,
    /// Gas limit used when estimation fails for a value transfer.
    pub native_gas_limit: u64,
    /// Gas limit used when estimation fails for a token transfer.
    pub token_gas_limit: u64,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            chain_id: chain_eth::chains::ETHEREUM.chain_id,
            native_gas_limit: 21_000,
            token_gas_limit: 65_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TronConfig {
    /// Maximum sun a TRC-20 call may burn.
    pub fee_limit: u64,
    pub default_energy_price: u64,
}

impl Default for TronConfig {
    fn default() -> Self {
        Self {
            fee_limit: 100_000_000,
            default_energy_price: chain_tron::DEFAULT_ENERGY_PRICE,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, TransferError> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| TransferError::Config(format!("parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, TransferError> {
        let content = fs::read_to_string(path)
            .map_err(|e| TransferError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), TransferError> {
        let mut problems = Vec::new();

        if self.ton.message_ttl_secs == 0 {
            problems.push("ton.message_ttl_secs must be positive".to_string());
        }
        if self.ton.jetton_transfer_value <= self.ton.jetton_forward_value {
            problems.push(
                "ton.jetton_transfer_value must exceed ton.jetton_forward_value".to_string(),
            );
        }
        if self.ton.jetton_transfer_value > chain_ton::MAX_COINS {
            problems.push("ton.jetton_transfer_value exceeds the coin range".to_string());
        }
        if chain_eth::chains::get_chain(self.evm.chain_id).is_none() {
            problems.push(format!("evm.chain_id {} is not a supported network", self.evm.chain_id));
        }
        if self.evm.native_gas_limit < 21_000 {
            problems.push("evm.native_gas_limit must be at least 21000".to_string());
        }
        if self.evm.token_gas_limit < self.evm.native_gas_limit {
            problems.push("evm.token_gas_limit must not be below evm.native_gas_limit".to_string());
        }
        if self.tron.fee_limit == 0 {
            problems.push("tron.fee_limit must be positive".to_string());
        }
        if self.tron.default_energy_price == 0 {
            problems.push("tron.default_energy_price must be positive".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(TransferError::Config(problems.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.ton.send_mode, 3);
        assert_eq!(config.ton.jetton_transfer_value, 640_000_000);
        assert_eq!(config.evm.chain_id, 1);
        assert_eq!(config.tron.default_energy_price, 420);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [evm]
            chain_id = 137
            "#,
        )
        .unwrap();
        assert_eq!(config.evm.chain_id, 137);
        assert_eq!(config.evm.native_gas_limit, 21_000);
        assert_eq!(config.ton, TonConfig::default());
    }

    #[test]
    fn unknown_chain_is_rejected() {
        let err = EngineConfig::from_toml_str("[evm]\nchain_id = 999999\n").unwrap_err();
        assert!(matches!(err, TransferError::Config(ref m) if m.contains("999999")));
    }

    #[test]
    fn all_problems_are_reported_together() {
        let err = EngineConfig::from_toml_str(
            r#"
            [ton]
            message_ttl_secs = 0
            [tron]
            fee_limit = 0
            "#,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("message_ttl_secs"));
        assert!(msg.contains("fee_limit"));
    }

    #[test]
    fn syntax_error_is_config_error() {
        let err = EngineConfig::from_toml_str("[ton\nsend_mode = 3").unwrap_err();
        assert!(matches!(err, TransferError::Config(ref m) if m.starts_with("parse error")));
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.toml")).unwrap_err();
        assert!(matches!(err, TransferError::Config(_)));
    }
}
