use serde::{Deserialize, Serialize};

use crate::error::PricerError;
use crate::types::*;
use crate::CrrResult;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Inputs of a single pricing call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingParameters {
    pub spot: Price,
    pub strike: Price,
    pub risk_free_rate: Rate,
    pub volatility: Rate,
    pub time_to_expiry: Years,
    pub steps: u32,
    pub option_type: OptionType,
}

/// Per-step constants of a CRR lattice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeFactors {
    /// Length of one time step, `T / N`.
    pub dt: Years,
    /// Up-move multiplier `exp(sigma * sqrt(dt))`.
    pub up: f64,
    /// Down-move multiplier `1 / up`.
    pub down: f64,
    /// Risk-neutral up probability. Not clamped to [0, 1].
    pub probability: f64,
    /// One-step discount factor `exp(-r * dt)`.
    pub discount: f64,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl PricingParameters {
    pub fn validate(&self) -> CrrResult<()> {
        require_positive("spot", self.spot)?;
        require_positive("strike", self.strike)?;
        require_positive("time_to_expiry", self.time_to_expiry)?;
        if !self.risk_free_rate.is_finite() {
            return Err(PricerError::invalid("risk_free_rate", "must be finite"));
        }
        if !self.volatility.is_finite() {
            return Err(PricerError::invalid("volatility", "must be finite"));
        }
        if self.volatility < 0.0 {
            return Err(PricerError::invalid("volatility", "must be non-negative"));
        }
        if self.steps < 1 {
            return Err(PricerError::invalid("steps", "must be at least 1"));
        }
        if self.steps > i32::MAX as u32 {
            return Err(PricerError::invalid("steps", "must not exceed i32::MAX"));
        }
        Ok(())
    }

    /// Validate and derive the lattice constants.
    pub fn factors(&self) -> CrrResult<LatticeFactors> {
        self.validate()?;
        LatticeFactors::derive(self)
    }
}

fn require_positive(field: &str, value: f64) -> CrrResult<()> {
    if !value.is_finite() {
        return Err(PricerError::invalid(field, "must be finite"));
    }
    if value <= 0.0 {
        return Err(PricerError::invalid(field, "must be positive"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Factor derivation
// ---------------------------------------------------------------------------

impl LatticeFactors {
    fn derive(params: &PricingParameters) -> CrrResult<Self> {
        let dt = params.time_to_expiry / f64::from(params.steps);
        let up = (params.volatility * dt.sqrt()).exp();
        let down = 1.0 / up;

        if !up.is_finite() {
            return Err(PricerError::NumericalInstability {
                context: format!(
                    "up factor overflow (volatility * sqrt(dt) = {})",
                    params.volatility * dt.sqrt()
                ),
            });
        }
        // Zero volatility, or volatility small enough that exp() rounds to 1.
        if up == down {
            return Err(PricerError::DegenerateLattice { up, down });
        }

        let probability = ((params.risk_free_rate * dt).exp() - down) / (up - down);
        if !probability.is_finite() {
            return Err(PricerError::NumericalInstability {
                context: "risk-neutral probability".into(),
            });
        }
        let discount = (-params.risk_free_rate * dt).exp();

        Ok(LatticeFactors {
            dt,
            up,
            down,
            probability,
            discount,
        })
    }

    /// Whether the up probability lies in [0, 1], i.e. the lattice is arbitrage-free.
    pub fn is_arbitrage_free(&self) -> bool {
        (0.0..=1.0).contains(&self.probability)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
