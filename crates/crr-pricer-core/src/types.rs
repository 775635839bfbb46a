use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PricerError;
use crate::CrrResult;

/// Prices of the underlying and of the option, in currency units.
pub type Price = f64;

/// Continuously compounded rates and volatilities as decimals (0.05 = 5%).
pub type Rate = f64;

/// Year fractions.
pub type Years = f64;

/// Days per year for the ACT/365F convention.
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Payoff of the option at maturity for an underlying price `spot`.
    pub fn payoff(self, spot: Price, strike: Price) -> Price {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => f.write_str("call"),
            OptionType::Put => f.write_str("put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = PricerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            other => Err(PricerError::InvalidInput {
                field: "option_type".into(),
                reason: format!("unrecognised option type '{other}', expected call or put"),
            }),
        }
    }
}

/// Year fraction between two dates under ACT/365F.
pub fn year_fraction(valuation_date: NaiveDate, expiry_date: NaiveDate) -> CrrResult<Years> {
    let days = (expiry_date - valuation_date).num_days();
    if days <= 0 {
        return Err(PricerError::InvalidInput {
            field: "expiry_date".into(),
            reason: format!("must be after valuation date {valuation_date}"),
        });
    }
    Ok(days as f64 / DAYS_PER_YEAR)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "f64_ieee754".to_string(),
        },
    }
}
