use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PricerError;
use crate::lattice::params::{LatticeFactors, PricingParameters};
use crate::types::*;
use crate::CrrResult;

/// Largest step count accepted with [`LatticeStrategy::FullTable`]: two
/// `(N + 1)^2` tables of f64, about 400 MB at this size.
pub const FULL_TABLE_MAX_STEPS: u32 = 5_000;

/// How the value lattice is held in memory during backward induction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatticeStrategy {
    /// One buffer of `N + 1` values, overwritten layer by layer.
    #[default]
    Rolling,
    /// Full `(N + 1) x (N + 1)` price and value tables.
    FullTable,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price a European option on a CRR lattice using the rolling buffer.
pub fn price(params: &PricingParameters) -> CrrResult<Price> {
    price_with(params, LatticeStrategy::Rolling)
}

/// Price a European option on a CRR lattice with an explicit memory strategy.
///
/// Both strategies perform the same arithmetic in the same order, so the
/// result does not depend on `strategy`.
pub fn price_with(params: &PricingParameters, strategy: LatticeStrategy) -> CrrResult<Price> {
    evaluate(params, strategy).map(|(_, value)| value)
}

/// Validate, derive the factors once and run the induction.
pub(crate) fn evaluate(
    params: &PricingParameters,
    strategy: LatticeStrategy,
) -> CrrResult<(LatticeFactors, Price)> {
    let factors = params.factors()?;
    if strategy == LatticeStrategy::FullTable && params.steps > FULL_TABLE_MAX_STEPS {
        return Err(PricerError::InvalidInput {
            field: "steps".into(),
            reason: format!(
                "full-table lattice is limited to {FULL_TABLE_MAX_STEPS} steps, got {}; use the rolling strategy",
                params.steps
            ),
        });
    }

    let value = match strategy {
        LatticeStrategy::Rolling => rolling_induction(params, &factors)?,
        LatticeStrategy::FullTable => full_table_induction(params, &factors)?,
    };

    if !value.is_finite() {
        return Err(PricerError::NumericalInstability {
            context: format!("backward induction over {} steps", params.steps),
        });
    }

    debug!(
        option_type = %params.option_type,
        steps = params.steps,
        up = factors.up,
        down = factors.down,
        probability = factors.probability,
        ?strategy,
        price = value,
        "priced european option on CRR lattice"
    );
    Ok((factors, value))
}

// ---------------------------------------------------------------------------
// Lattice construction
// ---------------------------------------------------------------------------

/// Underlying price at node (step, level): `S0 * u^(step - level) * d^level`.
///
/// `steps <= i32::MAX` is enforced by validation.
fn node_price(spot: Price, factors: &LatticeFactors, step: u32, level: u32) -> Price {
    spot * factors.up.powi((step - level) as i32) * factors.down.powi(level as i32)
}

/// Payoff at a terminal node. A non-finite node price (`u^k` overflowing,
/// or `inf * 0` when `d^j` underflows) is an error, never a zero payoff.
fn terminal_payoff(params: &PricingParameters, terminal: Price, level: u32) -> CrrResult<f64> {
    if !terminal.is_finite() {
        return Err(PricerError::NumericalInstability {
            context: format!(
                "terminal underlying price at level {level} of {} is {terminal}",
                params.steps
            ),
        });
    }
    Ok(params.option_type.payoff(terminal, params.strike))
}

#[inline]
fn step_back(factors: &LatticeFactors, up_value: f64, down_value: f64) -> f64 {
    factors.discount * (factors.probability * up_value + (1.0 - factors.probability) * down_value)
}

// ---------------------------------------------------------------------------
// Backward induction
// ---------------------------------------------------------------------------

fn rolling_induction(params: &PricingParameters, factors: &LatticeFactors) -> CrrResult<f64> {
    let n = params.steps;
    let mut values = (0..=n)
        .map(|level| terminal_payoff(params, node_price(params.spot, factors, n, level), level))
        .collect::<CrrResult<Vec<f64>>>()?;

    for step in (0..n as usize).rev() {
        for level in 0..=step {
            values[level] = step_back(factors, values[level], values[level + 1]);
        }
    }

    Ok(values[0])
}

fn full_table_induction(params: &PricingParameters, factors: &LatticeFactors) -> CrrResult<f64> {
    let n = params.steps;
    let size = n as usize + 1;

    // prices[step][level]
    let mut prices = vec![vec![0.0; size]; size];
    for step in 0..=n {
        for level in 0..=step {
            prices[step as usize][level as usize] = node_price(params.spot, factors, step, level);
        }
    }

    let mut values = vec![vec![0.0; size]; size];
    for level in 0..=n {
        values[n as usize][level as usize] =
            terminal_payoff(params, prices[n as usize][level as usize], level)?;
    }

    for step in (0..n as usize).rev() {
        for level in 0..=step {
            values[step][level] =
                step_back(factors, values[step + 1][level], values[step + 1][level + 1]);
        }
    }

    Ok(values[0][0])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn params(option_type: OptionType, steps: u32) -> PricingParameters {
        PricingParameters {
            spot: 100.0,
            strike: 100.0,
            risk_free_rate: 0.05,
            volatility: 0.2,
            time_to_expiry: 1.0,
            steps,
            option_type,
        }
    }

    #[test]
    fn test_node_price_uses_integer_powers() {
        let p = params(OptionType::Call, 3);
        let f = p.factors().unwrap();
        assert_eq!(node_price(100.0, &f, 3, 0), 100.0 * (f.up * f.up * f.up) * 1.0);
        assert_eq!(node_price(100.0, &f, 3, 3), 100.0 * 1.0 * (f.down * f.down * f.down));
    }

    #[test]
    fn test_node_price_recombines() {
        let p = params(OptionType::Call, 4);
        let f = p.factors().unwrap();
        // One up and one down lands back near spot.
        assert!((node_price(100.0, &f, 2, 1) - 100.0).abs() < 1e-12);
        assert_eq!(node_price(100.0, &f, 0, 0), 100.0);
        assert!(node_price(100.0, &f, 4, 0) > node_price(100.0, &f, 4, 1));
    }

    #[test]
    fn test_three_step_reference_values() {
        let call = price(&params(OptionType::Call, 3)).unwrap();
        let put = price(&params(OptionType::Put, 3)).unwrap();
        assert!((call - 11.043871091951113).abs() < 1e-12, "call = {call}");
        assert!((put - 6.166813542022532).abs() < 1e-12, "put = {put}");
    }

    #[test]
    fn test_strategies_agree_bitwise() {
        for steps in [1, 2, 3, 7, 64, 250] {
            for option_type in [OptionType::Call, OptionType::Put] {
                let p = params(option_type, steps);
                let rolling = price_with(&p, LatticeStrategy::Rolling).unwrap();
                let table = price_with(&p, LatticeStrategy::FullTable).unwrap();
                assert_eq!(rolling.to_bits(), table.to_bits(), "steps={steps} {option_type}");
            }
        }
    }

    #[test]
    fn test_deep_otm_call_is_worthless_on_small_tree() {
        let p = PricingParameters {
            strike: 1_000.0,
            ..params(OptionType::Call, 2)
        };
        assert_eq!(price(&p).unwrap(), 0.0);
    }

    #[test]
    fn test_zero_volatility_rejected_by_both_strategies() {
        let p = PricingParameters {
            volatility: 0.0,
            ..params(OptionType::Put, 10)
        };
        for strategy in [LatticeStrategy::Rolling, LatticeStrategy::FullTable] {
            assert!(matches!(
                price_with(&p, strategy),
                Err(PricerError::DegenerateLattice { .. })
            ));
        }
    }

    #[test]
    fn test_terminal_overflow_reported() {
        // sigma * sqrt(T * N) is far beyond exp() range at the top node.
        let p = PricingParameters {
            volatility: 40.0,
            steps: 2_000,
            time_to_expiry: 10.0,
            ..params(OptionType::Call, 1)
        };
        assert!(matches!(
            price(&p),
            Err(PricerError::NumericalInstability { .. })
        ));
    }

    #[test]
    fn test_overflow_underflow_band_is_not_a_zero_payoff() {
        // u^(N-j) overflows while d^j underflows, so mid-lattice nodes are inf * 0.
        for option_type in [OptionType::Put, OptionType::Call] {
            let p = PricingParameters {
                volatility: 1000.0f64.sqrt(),
                ..params(option_type, 4_000)
            };
            match price(&p).unwrap_err() {
                PricerError::NumericalInstability { context } => {
                    assert!(context.contains("terminal"), "{context}")
                }
                other => panic!("Expected NumericalInstability, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_full_table_overflow_matches_rolling() {
        // u = e^5; levels ~150..258 of 400 are inf * 0.
        let p = PricingParameters {
            volatility: 100.0,
            ..params(OptionType::Put, 400)
        };
        for strategy in [LatticeStrategy::Rolling, LatticeStrategy::FullTable] {
            assert!(matches!(
                price_with(&p, strategy),
                Err(PricerError::NumericalInstability { .. })
            ));
        }
    }

    #[test]
    fn test_full_table_step_cap_rejected_before_allocation() {
        let p = params(OptionType::Call, 100_000);
        match price_with(&p, LatticeStrategy::FullTable).unwrap_err() {
            PricerError::InvalidInput { field, reason } => {
                assert_eq!(field, "steps");
                assert!(reason.contains("rolling"));
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
        let over_cap = params(OptionType::Call, FULL_TABLE_MAX_STEPS + 1);
        assert!(price_with(&over_cap, LatticeStrategy::FullTable).is_err());
    }

    #[test]
    fn test_strategy_serde_names() {
        let s = serde_json::to_string(&LatticeStrategy::FullTable).unwrap();
        assert_eq!(s, "\"full_table\"");
        assert_eq!(LatticeStrategy::default(), LatticeStrategy::Rolling);
    }
}
