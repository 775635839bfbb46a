use clap::Args;
use serde_json::Value;

use crr_pricer_core::lattice::{self, LatticeStrategy, OptionPricingInput};

use super::{read_structured_input, Limits, ParameterFlags};

/// Arguments for option pricing
#[derive(Args)]
pub struct PriceArgs {
    #[command(flatten)]
    pub params: ParameterFlags,

    /// Number of lattice steps (N)
    #[arg(long, default_value_t = 100)]
    pub steps: u32,

    /// Lattice memory layout
    #[arg(long, value_enum, default_value = "rolling")]
    pub lattice: LatticeArg,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum LatticeArg {
    Rolling,
    FullTable,
}

impl From<LatticeArg> for LatticeStrategy {
    fn from(arg: LatticeArg) -> Self {
        match arg {
            LatticeArg::Rolling => LatticeStrategy::Rolling,
            LatticeArg::FullTable => LatticeStrategy::FullTable,
        }
    }
}

pub fn run_price(args: PriceArgs, limits: &Limits) -> Result<Value, Box<dyn std::error::Error>> {
    let pricing_input: OptionPricingInput = match read_structured_input(args.input.as_deref())? {
        Some(input) => input,
        None => OptionPricingInput {
            params: args.params.to_params(args.steps)?,
            strategy: args.lattice.into(),
        },
    };
    limits.check_steps(pricing_input.params.steps)?;

    let result = lattice::price_option(&pricing_input)?;
    Ok(serde_json::to_value(result)?)
}
