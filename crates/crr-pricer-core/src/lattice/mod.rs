//! Cox-Ross-Rubinstein recombining binomial lattice for European options.
//!
//! [`price`] is the bare engine: validated parameters in, a full-precision
//! price out. [`price_option`] wraps the same engine in a
//! [`ComputationOutput`](crate::types::ComputationOutput) report.

pub mod engine;
pub mod params;
pub mod pricing;

pub use engine::{price, price_with, LatticeStrategy, FULL_TABLE_MAX_STEPS};
pub use params::{LatticeFactors, PricingParameters};
pub use pricing::{price_option, OptionPricingInput, OptionPricingOutput};
