//! Gas price tiers for replacement transactions

use crate::chain::GasPriceEstimates;
use crate::config::GasConfig;

use ethers::types::U256;
use tracing::debug;

/// Wei per gwei
const GWEI: u64 = 1_000_000_000;

/// Gas limit of a plain value transfer; enough for a zero-value self-send
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Derives slow / average / fast tiers from a single node gas price
#[derive(Debug, Clone)]
pub struct GasEstimator {
    /// Premium over the node price for the fast tier (e.g., 25 = 25%)
    fast_premium_percent: u64,
    /// Discount under the node price for the slow tier
    slow_discount_percent: u64,
}

impl GasEstimator {
    pub fn new(config: &GasConfig) -> Self {
        Self {
            fast_premium_percent: config.fast_premium_percent,
            slow_discount_percent: config.slow_discount_percent.min(100),
        }
    }

    /// Spread `base` into tiers, each capped at `max_gas_price_gwei`
    pub fn estimates(&self, base: U256, max_gas_price_gwei: u64) -> GasPriceEstimates {
        let cap = gwei_to_wei(max_gas_price_gwei);

        let slow = base - base * self.slow_discount_percent / 100;
        let fast = base + base * self.fast_premium_percent / 100;

        let estimates = GasPriceEstimates {
            slow: slow.min(cap),
            average: base.min(cap),
            fast: fast.min(cap),
        };

        debug!("Gas tiers from base {}: {:?}", base, estimates);
        estimates
    }
}

impl Default for GasEstimator {
    fn default() -> Self {
        Self::new(&GasConfig::default())
    }
}

pub fn gwei_to_wei(gwei: u64) -> U256 {
    U256::from(gwei) * U256::from(GWEI)
}

/// Render a quantity in the chain's canonical hex form (`0x0` for zero)
pub fn to_hex_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_are_ordered() {
        let estimator = GasEstimator::default();
        let tiers = estimator.estimates(gwei_to_wei(40), 500);

        assert_eq!(tiers.slow, gwei_to_wei(32));
        assert_eq!(tiers.average, gwei_to_wei(40));
        assert_eq!(tiers.fast, gwei_to_wei(50));
    }

    #[test]
    fn test_tiers_are_capped() {
        let estimator = GasEstimator::default();
        let tiers = estimator.estimates(gwei_to_wei(90), 100);

        assert_eq!(tiers.average, gwei_to_wei(90));
        assert_eq!(tiers.fast, gwei_to_wei(100));
    }

    #[test]
    fn test_hex_quantity() {
        assert_eq!(to_hex_quantity(U256::zero()), "0x0");
        assert_eq!(to_hex_quantity(U256::from(TRANSFER_GAS_LIMIT)), "0x5208");
        assert_eq!(to_hex_quantity(gwei_to_wei(20)), "0x4a817c800");
    }
}
