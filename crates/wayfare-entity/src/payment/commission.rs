//! Platform commission split.

use serde::{Deserialize, Serialize};

/// Basis points in one whole.
const BASIS_POINTS: i64 = 10_000;

/// Platform/provider split of a captured amount, frozen at completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    /// Commission rate in basis points (1500 = 15%).
    pub rate_bps: i32,
    /// Platform share, minor units.
    pub commission_amount: i64,
    /// Provider share, minor units.
    pub provider_amount: i64,
}

impl CommissionSplit {
    /// Split `amount` at `rate_bps`, rounding the commission half-up.
    ///
    /// The provider share is the remainder, so the two always sum to
    /// `amount` exactly.
    pub fn compute(amount: i64, rate_bps: i32) -> Self {
        let commission_amount = (amount * i64::from(rate_bps) + BASIS_POINTS / 2) / BASIS_POINTS;
        Self {
            rate_bps,
            commission_amount,
            provider_amount: amount - commission_amount,
        }
    }
}
