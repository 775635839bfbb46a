//! Closed-form Black-Scholes price, used as the continuous-time limit the
//! CRR lattice converges to.

use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::PricerError;
use crate::lattice::PricingParameters;
use crate::types::*;
use crate::CrrResult;

/// Black-Scholes price of a European option. `params.steps` is ignored.
pub fn black_scholes_price(params: &PricingParameters) -> CrrResult<Price> {
    params.validate()?;
    if params.volatility <= 0.0 {
        return Err(PricerError::invalid(
            "volatility",
            "must be positive for the closed-form price",
        ));
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| PricerError::NumericalInstability {
        context: format!("standard normal construction: {e}"),
    })?;

    let s = params.spot;
    let k = params.strike;
    let r = params.risk_free_rate;
    let t = params.time_to_expiry;
    let vol_sqrt_t = params.volatility * t.sqrt();

    let d1 = ((s / k).ln() + (r + 0.5 * params.volatility * params.volatility) * t) / vol_sqrt_t;
    let d2 = d1 - vol_sqrt_t;
    let discounted_strike = k * (-r * t).exp();

    let price = match params.option_type {
        OptionType::Call => s * normal.cdf(d1) - discounted_strike * normal.cdf(d2),
        OptionType::Put => discounted_strike * normal.cdf(-d2) - s * normal.cdf(-d1),
    };
    Ok(price)
}
