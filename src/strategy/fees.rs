//! Fee-adjusted profit model.
//!
//! Pure arithmetic over entry/exit prices, notional, and the platform fee
//! rate. Fast-settling markets carry a much higher fee rate than standard
//! ones, so every candidate trade is priced here before it exists as an
//! `Opportunity`.

use crate::types::VeloError;

/// Fee rate applied to fast-settling (5/15 minute) markets.
pub const FAST_MARKET_FEE: f64 = 0.10;

/// Fee rate applied to standard markets.
pub const STANDARD_FEE: f64 = 0.02;

/// Fully computed cost breakdown for a prospective round trip.
///
/// `net_profit = gross_profit - entry_fee - exit_fee` holds exactly by
/// construction; callers read `fees()` for the combined charge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeCosts {
    pub shares: f64,
    pub exit_value: f64,
    pub gross_profit: f64,
    pub entry_fee: f64,
    pub exit_fee: f64,
    pub net_profit: f64,
}

impl TradeCosts {
    /// Price a round trip: buy `amount` USD at `entry_price`, exit the full
    /// position at `exit_price`, paying `fee_rate` on both legs.
    ///
    /// Prices must lie in (0, 1], the amount must be positive, and the fee
    /// rate must lie in [0, 1). Violations fail with
    /// [`VeloError::InvalidInput`] — a zero entry price is rejected here,
    /// never allowed to divide into infinity.
    pub fn compute(
        entry_price: f64,
        exit_price: f64,
        amount: f64,
        fee_rate: f64,
    ) -> Result<Self, VeloError> {
        if !entry_price.is_finite() || entry_price <= 0.0 || entry_price > 1.0 {
            return Err(VeloError::InvalidInput(format!(
                "entry_price {entry_price} must be in (0, 1]"
            )));
        }
        if !exit_price.is_finite() || exit_price <= 0.0 || exit_price > 1.0 {
            return Err(VeloError::InvalidInput(format!(
                "exit_price {exit_price} must be in (0, 1]"
            )));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(VeloError::InvalidInput(format!(
                "amount {amount} must be > 0"
            )));
        }
        if !fee_rate.is_finite() || !(0.0..1.0).contains(&fee_rate) {
            return Err(VeloError::InvalidInput(format!(
                "fee_rate {fee_rate} must be in [0, 1)"
            )));
        }

        let shares = amount / entry_price;
        let exit_value = shares * exit_price;
        let gross_profit = exit_value - amount;

        let entry_fee = amount * fee_rate;
        let exit_fee = exit_value * fee_rate;
        let net_profit = gross_profit - entry_fee - exit_fee;

        Ok(Self {
            shares,
            exit_value,
            gross_profit,
            entry_fee,
            exit_fee,
            net_profit,
        })
    }

    /// Combined entry + exit fee.
    pub fn fees(&self) -> f64 {
        self.entry_fee + self.exit_fee
    }

    /// Whether the trade clears the minimum net return on notional:
    /// `net_profit >= amount * min_profit_ratio`.
    pub fn is_profitable(&self, amount: f64, min_profit_ratio: f64) -> bool {
        self.net_profit >= amount * min_profit_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_market_round_trip_is_unprofitable() {
        // Worked example: 0.50 -> 0.55 on $2 at the 10% fast fee.
        let costs = TradeCosts::compute(0.50, 0.55, 2.00, 0.10).unwrap();
        assert!((costs.shares - 4.0).abs() < 1e-10);
        assert!((costs.exit_value - 2.20).abs() < 1e-10);
        assert!((costs.gross_profit - 0.20).abs() < 1e-10);
        assert!((costs.entry_fee - 0.20).abs() < 1e-10);
        assert!((costs.exit_fee - 0.22).abs() < 1e-10);
        assert!((costs.net_profit - (-0.22)).abs() < 1e-10);
        assert!(!costs.is_profitable(2.00, 0.0));
    }

    #[test]
    fn test_standard_fee_round_trip_is_profitable() {
        // Worked example: 0.50 -> 0.60 on $2 at the 2% standard fee.
        let costs = TradeCosts::compute(0.50, 0.60, 2.00, 0.02).unwrap();
        assert!((costs.gross_profit - 0.40).abs() < 1e-10);
        assert!((costs.fees() - 0.088).abs() < 1e-10);
        assert!((costs.net_profit - 0.312).abs() < 1e-10);
        assert!(costs.is_profitable(2.00, 0.01));
        assert!(costs.is_profitable(2.00, 0.15));
        assert!(!costs.is_profitable(2.00, 0.16));
    }

    #[test]
    fn test_net_profit_identity() {
        let costs = TradeCosts::compute(0.37, 0.61, 5.25, 0.02).unwrap();
        let expected = costs.gross_profit - (5.25 * 0.02 + costs.exit_value * 0.02);
        assert!((costs.net_profit - expected).abs() < 1e-12);
        assert!((costs.net_profit - (costs.gross_profit - costs.fees())).abs() < 1e-12);
    }

    #[test]
    fn test_zero_entry_price_rejected() {
        let err = TradeCosts::compute(0.0, 0.55, 2.00, 0.10).unwrap_err();
        assert!(matches!(err, VeloError::InvalidInput(_)));
    }

    #[test]
    fn test_out_of_range_prices_rejected() {
        assert!(TradeCosts::compute(-0.1, 0.55, 2.0, 0.10).is_err());
        assert!(TradeCosts::compute(1.2, 0.55, 2.0, 0.10).is_err());
        assert!(TradeCosts::compute(0.5, 0.0, 2.0, 0.10).is_err());
        assert!(TradeCosts::compute(0.5, 1.5, 2.0, 0.10).is_err());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        assert!(TradeCosts::compute(0.5, 0.6, 0.0, 0.10).is_err());
        assert!(TradeCosts::compute(0.5, 0.6, -2.0, 0.10).is_err());
    }

    #[test]
    fn test_bad_fee_rate_rejected() {
        assert!(TradeCosts::compute(0.5, 0.6, 2.0, -0.01).is_err());
        assert!(TradeCosts::compute(0.5, 0.6, 2.0, 1.0).is_err());
    }

    #[test]
    fn test_nan_inputs_rejected() {
        assert!(TradeCosts::compute(f64::NAN, 0.6, 2.0, 0.1).is_err());
        assert!(TradeCosts::compute(0.5, f64::NAN, 2.0, 0.1).is_err());
        assert!(TradeCosts::compute(0.5, 0.6, f64::INFINITY, 0.1).is_err());
    }

    #[test]
    fn test_never_produces_non_finite_output() {
        // A tiny but valid entry price yields finite numbers, not inf/NaN.
        let costs = TradeCosts::compute(1e-9, 0.5, 1.0, 0.02).unwrap();
        assert!(costs.shares.is_finite());
        assert!(costs.net_profit.is_finite());
    }

    #[test]
    fn test_profit_monotonic_in_exit_price() {
        // For a YES position, raising the assumed exit price never lowers
        // net profit.
        let mut last = f64::NEG_INFINITY;
        for exit in [0.40, 0.50, 0.60, 0.70, 0.80, 0.90] {
            let costs = TradeCosts::compute(0.40, exit, 2.0, 0.02).unwrap();
            assert!(costs.net_profit >= last);
            last = costs.net_profit;
        }
    }

    #[test]
    fn test_zero_fee_rate_means_gross_equals_net() {
        let costs = TradeCosts::compute(0.5, 0.6, 2.0, 0.0).unwrap();
        assert!((costs.net_profit - costs.gross_profit).abs() < 1e-12);
        assert_eq!(costs.fees(), 0.0);
    }

    #[test]
    fn test_losing_trade_has_negative_net() {
        let costs = TradeCosts::compute(0.60, 0.50, 2.0, 0.02).unwrap();
        assert!(costs.gross_profit < 0.0);
        assert!(costs.net_profit < costs.gross_profit);
    }
}
