//! Fee models. Estimation is best effort: a failed read never fails a bake,
//! it yields a zero quote plus a [`FeeEstimationFailure`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ChainFamily, FeeQuote};

/// A soft warning attached to a bake whose fee could not be estimated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimationFailure {
    pub family: ChainFamily,
    /// Which read or model failed, e.g. `"fee_market_rate"`.
    pub stage: String,
    pub reason: String,
}

impl fmt::Display for FeeEstimationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} fee estimation failed at {}: {}",
            self.family.display_name(),
            self.stage,
            self.reason
        )
    }
}

/// A quote plus the warning explaining why it may be zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEstimate {
    pub quote: FeeQuote,
    pub warning: Option<FeeEstimationFailure>,
}

impl FeeEstimate {
    pub fn exact(quote: FeeQuote) -> Self {
        Self {
            quote,
            warning: None,
        }
    }

    pub fn degraded(family: ChainFamily, stage: &str, reason: impl Into<String>) -> Self {
        Self {
            quote: FeeQuote::zero(),
            warning: Some(FeeEstimationFailure {
                family,
                stage: stage.to_string(),
                reason: reason.into(),
            }),
        }
    }

    pub fn total(&self) -> u128 {
        self.quote.total
    }
}

/// EVM: `gas × (base + priority)`.
pub fn dynamic_two_part(base_fee: u128, priority_fee: u128, gas: u64) -> FeeQuote {
    let per_unit = base_fee.saturating_add(priority_fee);
    FeeQuote {
        base_rate: base_fee,
        priority_rate: Some(priority_fee),
        computation_units: gas,
        total: per_unit.saturating_mul(u128::from(gas)),
    }
}

/// TRON TRC-20: `energy × price`.
pub fn energy(energy_used: u64, price: u64) -> FeeQuote {
    FeeQuote {
        base_rate: u128::from(price),
        priority_rate: None,
        computation_units: energy_used,
        total: u128::from(energy_used).saturating_mul(u128::from(price)),
    }
}

/// TON: the emulated balance change minus what the message itself carries away.
pub fn simulated(balance_delta: i128, value_sent: u128) -> FeeQuote {
    FeeQuote {
        base_rate: 0,
        priority_rate: None,
        computation_units: 0,
        total: balance_delta.unsigned_abs().saturating_sub(value_sent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_part_fee() {
        let q = dynamic_two_part(10, 5, 1_000);
        assert_eq!(q.total, 15_000);
        assert_eq!(q.priority_rate, Some(5));
        assert_eq!(q.computation_units, 1_000);
    }

    #[test]
    fn two_part_fee_saturates() {
        assert_eq!(dynamic_two_part(u128::MAX, 1, 2).total, u128::MAX);
    }

    #[test]
    fn energy_fee() {
        let q = energy(31_895, 420);
        assert_eq!(q.total, 13_395_900);
        assert_eq!(q.base_rate, 420);
    }

    #[test]
    fn simulated_fee_subtracts_value() {
        assert_eq!(simulated(-1_005_000_000, 1_000_000_000).total, 5_000_000);
        assert_eq!(simulated(-3_000_000, 0).total, 3_000_000);
    }

    #[test]
    fn simulated_fee_never_negative() {
        assert_eq!(simulated(-10, 100).total, 0);
        assert_eq!(simulated(0, 0).total, 0);
    }

    #[test]
    fn degraded_estimate_is_zero_with_warning() {
        let e = FeeEstimate::degraded(ChainFamily::Evm, "estimate_gas", "timeout");
        assert_eq!(e.total(), 0);
        let w = e.warning.unwrap();
        assert_eq!(w.to_string(), "EVM fee estimation failed at estimate_gas: timeout");
    }

    #[test]
    fn exact_estimate_has_no_warning() {
        let e = FeeEstimate::exact(energy(1, 2));
        assert!(e.warning.is_none());
        assert_eq!(e.total(), 2);
    }
}
