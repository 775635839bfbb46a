pub mod analytics;
pub mod pricing;
pub mod scenarios;

use chrono::NaiveDate;
use clap::Args;
use serde::de::DeserializeOwned;

use crr_pricer_core::lattice::PricingParameters;
use crr_pricer_core::types::{year_fraction, OptionType};

use crate::input;

/// Caller-side bounds applied before any lattice is built.
pub struct Limits {
    pub max_steps: u32,
}

impl Limits {
    pub fn check_steps(&self, steps: u32) -> Result<(), Box<dyn std::error::Error>> {
        if steps > self.max_steps {
            return Err(format!(
                "{steps} steps exceeds --max-steps {} (work grows as N^2)",
                self.max_steps
            )
            .into());
        }
        Ok(())
    }
}

/// Pricing parameters supplied as individual flags.
#[derive(Args)]
pub struct ParameterFlags {
    /// Initial price of the underlying (S0)
    #[arg(long, alias = "s0")]
    pub spot: Option<f64>,

    /// Strike price (K)
    #[arg(long, alias = "k")]
    pub strike: Option<f64>,

    /// Continuously compounded risk-free rate (e.g. 0.05 for 5%)
    #[arg(long, alias = "risk-free-rate", allow_negative_numbers = true)]
    pub rate: Option<f64>,

    /// Annualised volatility (e.g. 0.2 for 20%)
    #[arg(long, alias = "sigma")]
    pub volatility: Option<f64>,

    /// Time to maturity in years (T)
    #[arg(long, alias = "time-to-expiry", conflicts_with = "expiry_date")]
    pub time: Option<f64>,

    /// Valuation date (YYYY-MM-DD), used with --expiry-date; defaults to today
    #[arg(long, requires = "expiry_date")]
    pub valuation_date: Option<NaiveDate>,

    /// Expiry date (YYYY-MM-DD); T is derived as ACT/365F
    #[arg(long)]
    pub expiry_date: Option<NaiveDate>,

    /// Call or put
    #[arg(long, default_value = "call")]
    pub option_type: OptionType,
}

impl ParameterFlags {
    pub fn time_to_expiry(&self) -> Result<f64, Box<dyn std::error::Error>> {
        match (self.time, self.expiry_date) {
            (Some(t), _) => Ok(t),
            (None, Some(expiry)) => {
                let valuation = self
                    .valuation_date
                    .unwrap_or_else(|| chrono::Local::now().date_naive());
                Ok(year_fraction(valuation, expiry)?)
            }
            (None, None) => Err("--time or --expiry-date is required (or provide --input)".into()),
        }
    }

    pub fn to_params(&self, steps: u32) -> Result<PricingParameters, Box<dyn std::error::Error>> {
        Ok(PricingParameters {
            spot: self
                .spot
                .ok_or("--spot is required (or provide --input)")?,
            strike: self
                .strike
                .ok_or("--strike is required (or provide --input)")?,
            risk_free_rate: self
                .rate
                .ok_or("--rate is required (or provide --input)")?,
            volatility: self
                .volatility
                .ok_or("--volatility is required (or provide --input)")?,
            time_to_expiry: self.time_to_expiry()?,
            steps,
            option_type: self.option_type,
        })
    }
}

/// Read a typed input from `--input <file>` or piped stdin, if either is present.
pub fn read_structured_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(input::file::read_input(path)?));
    }
    match input::stdin::read_stdin()? {
        Some(data) => Ok(Some(serde_json::from_value(data)?)),
        None => Ok(None),
    }
}
