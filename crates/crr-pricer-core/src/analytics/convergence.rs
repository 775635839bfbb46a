use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::analytics::black_scholes::black_scholes_price;
use crate::error::PricerError;
use crate::lattice::{price, PricingParameters};
use crate::types::*;
use crate::CrrResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceInput {
    /// Base parameters; `steps` is replaced by each entry of `step_counts`.
    #[serde(flatten)]
    pub params: PricingParameters,
    pub step_counts: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRow {
    pub steps: u32,
    pub lattice_price: Price,
    pub black_scholes_price: Price,
    pub absolute_error: f64,
    /// `absolute_error * steps`; roughly flat when error is O(1/N).
    pub scaled_error: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceOutput {
    pub black_scholes_price: Price,
    pub rows: Vec<ConvergenceRow>,
    /// `C - P - (S0 - K e^{-rT})` at the largest step count.
    pub parity_residual: f64,
}

fn normalise_step_counts(step_counts: &[u32]) -> CrrResult<Vec<u32>> {
    if step_counts.is_empty() {
        return Err(PricerError::invalid("step_counts", "at least one step count required"));
    }
    if step_counts.contains(&0) {
        return Err(PricerError::invalid("step_counts", "every step count must be at least 1"));
    }
    let mut counts = step_counts.to_vec();
    counts.sort_unstable();
    counts.dedup();
    Ok(counts)
}

/// Price the option at each step count and compare against Black-Scholes.
pub fn convergence_study(input: &ConvergenceInput) -> CrrResult<ComputationOutput<ConvergenceOutput>> {
    let start = Instant::now();
    let counts = normalise_step_counts(&input.step_counts)?;
    let reference = black_scholes_price(&input.params)?;

    let rows = counts
        .iter()
        .map(|&steps| {
            let lattice_price = price(&PricingParameters { steps, ..input.params })?;
            let absolute_error = (lattice_price - reference).abs();
            Ok(ConvergenceRow {
                steps,
                lattice_price,
                black_scholes_price: reference,
                absolute_error,
                scaled_error: absolute_error * f64::from(steps),
            })
        })
        .collect::<CrrResult<Vec<_>>>()?;

    // Non-empty by construction.
    let finest = counts[counts.len() - 1];
    let call = price(&PricingParameters {
        steps: finest,
        option_type: OptionType::Call,
        ..input.params
    })?;
    let put = price(&PricingParameters {
        steps: finest,
        option_type: OptionType::Put,
        ..input.params
    })?;
    let p = &input.params;
    let parity_residual =
        call - put - (p.spot - p.strike * (-p.risk_free_rate * p.time_to_expiry).exp());

    let mut warnings = Vec::new();
    if let [.., prev, last] = rows.as_slice() {
        if last.absolute_error > prev.absolute_error {
            warnings.push(format!(
                "Error grew from {} to {} steps; CRR prices oscillate between even and odd step counts",
                prev.steps, last.steps
            ));
        }
    }

    let output = ConvergenceOutput {
        black_scholes_price: reference,
        rows,
        parity_residual,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CRR lattice convergence against Black-Scholes",
        &serde_json::json!({
            "option_type": p.option_type,
            "step_counts": counts,
        }),
        warnings,
        elapsed,
        output,
    ))
}
