use clap::Args;
use serde_json::Value;

use crr_pricer_core::lattice::PricingParameters;
use crr_pricer_core::scenarios::sensitivity::{
    self, LadderInput, ParameterKind, SensitivityInput, SensitivityVariable,
};

use super::{read_structured_input, Limits, ParameterFlags};

/// Arguments for a one-parameter price ladder
#[derive(Args)]
pub struct LadderArgs {
    #[command(flatten)]
    pub params: ParameterFlags,

    /// Number of lattice steps (N) for the base case
    #[arg(long, default_value_t = 100)]
    pub steps: u32,

    /// Variable to sweep, name:min:max:step (e.g. "spot:80:120:5")
    #[arg(long = "var")]
    pub variable: SensitivityVariable,

    /// Path to JSON or YAML file with base case parameters
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub params: ParameterFlags,

    /// Number of lattice steps (N) for the base case
    #[arg(long, default_value_t = 100)]
    pub steps: u32,

    /// First sensitivity variable in format name:min:max:step
    /// (e.g. "spot:80:120:10")
    #[arg(long)]
    pub var1: SensitivityVariable,

    /// Second sensitivity variable (e.g. "volatility:0.1:0.4:0.1")
    #[arg(long)]
    pub var2: SensitivityVariable,

    /// Path to JSON or YAML file with base case parameters
    #[arg(long)]
    pub input: Option<String>,
}

fn base_params(
    flags: &ParameterFlags,
    steps: u32,
    path: Option<&str>,
) -> Result<PricingParameters, Box<dyn std::error::Error>> {
    match read_structured_input(path)? {
        Some(base) => Ok(base),
        None => flags.to_params(steps),
    }
}

/// The largest step count a sweep can reach.
fn peak_steps(base: &PricingParameters, vars: &[&SensitivityVariable]) -> u32 {
    vars.iter()
        .filter(|v| v.name == ParameterKind::Steps)
        .map(|v| v.max.max(0.0).min(f64::from(u32::MAX)) as u32)
        .fold(base.steps, u32::max)
}

pub fn run_ladder(args: LadderArgs, limits: &Limits) -> Result<Value, Box<dyn std::error::Error>> {
    let base = base_params(&args.params, args.steps, args.input.as_deref())?;
    limits.check_steps(peak_steps(&base, &[&args.variable]))?;

    let result = sensitivity::price_ladder(&LadderInput {
        base,
        variable: args.variable,
    })?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_sensitivity(
    args: SensitivityArgs,
    limits: &Limits,
) -> Result<Value, Box<dyn std::error::Error>> {
    let base = base_params(&args.params, args.steps, args.input.as_deref())?;
    limits.check_steps(peak_steps(&base, &[&args.var1, &args.var2]))?;

    let result = sensitivity::sensitivity_grid(&SensitivityInput {
        base,
        variable_1: args.var1,
        variable_2: args.var2,
    })?;
    Ok(serde_json::to_value(result)?)
}
