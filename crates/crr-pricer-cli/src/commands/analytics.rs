use clap::Args;
use serde_json::Value;

use crr_pricer_core::analytics::convergence::{self, ConvergenceInput};

use super::{read_structured_input, Limits, ParameterFlags};

/// Arguments for a convergence study
#[derive(Args)]
pub struct ConvergenceArgs {
    #[command(flatten)]
    pub params: ParameterFlags,

    /// Comma-separated step counts to price at
    #[arg(long, value_delimiter = ',', default_value = "10,50,100,500,1000")]
    pub steps_list: Vec<u32>,

    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_convergence(
    args: ConvergenceArgs,
    limits: &Limits,
) -> Result<Value, Box<dyn std::error::Error>> {
    let study: ConvergenceInput = match read_structured_input(args.input.as_deref())? {
        Some(input) => input,
        None => ConvergenceInput {
            params: args.params.to_params(1)?,
            step_counts: args.steps_list,
        },
    };
    for &steps in &study.step_counts {
        limits.check_steps(steps)?;
    }

    let result = convergence::convergence_study(&study)?;
    Ok(serde_json::to_value(result)?)
}
