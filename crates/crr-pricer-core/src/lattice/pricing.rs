use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::lattice::engine::{evaluate, LatticeStrategy};
use crate::lattice::params::{LatticeFactors, PricingParameters};
use crate::types::*;
use crate::CrrResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPricingInput {
    #[serde(flatten)]
    pub params: PricingParameters,
    #[serde(default)]
    pub strategy: LatticeStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionPricingOutput {
    pub price: Price,
    pub intrinsic_value: Price,
    pub time_value: Price,
    pub moneyness: String,
    pub factors: LatticeFactors,
    pub steps: u32,
    pub strategy: LatticeStrategy,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn classify_moneyness(spot: Price, strike: Price, option_type: OptionType) -> String {
    let ratio = spot / strike;
    // ATM band: within 1% of strike
    let (atm_lo, atm_hi) = (0.99, 1.01);
    let itm = match option_type {
        OptionType::Call => ratio > atm_hi,
        OptionType::Put => ratio < atm_lo,
    };
    let otm = match option_type {
        OptionType::Call => ratio < atm_lo,
        OptionType::Put => ratio > atm_hi,
    };
    if itm {
        "ITM".into()
    } else if otm {
        "OTM".into()
    } else {
        "ATM".into()
    }
}

// ---------------------------------------------------------------------------
// Public API: price_option
// ---------------------------------------------------------------------------

pub fn price_option(
    input: &OptionPricingInput,
) -> CrrResult<ComputationOutput<OptionPricingOutput>> {
    let start = Instant::now();
    let params = &input.params;

    let (factors, price) = evaluate(params, input.strategy)?;

    let mut warnings = Vec::new();
    if !factors.is_arbitrage_free() {
        warn!(
            probability = factors.probability,
            "risk-neutral probability outside [0, 1]"
        );
        warnings.push(format!(
            "Risk-neutral probability {:.6} lies outside [0, 1]; the lattice admits arbitrage \
             and the price may be negative or unreliable. Increase steps or volatility.",
            factors.probability
        ));
    }

    let intrinsic_value = params.option_type.payoff(params.spot, params.strike);
    let output = OptionPricingOutput {
        price,
        intrinsic_value,
        time_value: price - intrinsic_value,
        moneyness: classify_moneyness(params.spot, params.strike, params.option_type),
        factors,
        steps: params.steps,
        strategy: input.strategy,
    };

    let assumptions = serde_json::json!({
        "model": "Cox-Ross-Rubinstein",
        "exercise_style": "European",
        "risk_free_rate": params.risk_free_rate,
        "volatility": params.volatility,
        "time_to_expiry": params.time_to_expiry,
        "steps": params.steps,
        "strategy": input.strategy,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CRR Binomial Tree (European, backward induction)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
