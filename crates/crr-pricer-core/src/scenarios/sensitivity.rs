use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::error::PricerError;
use crate::lattice::{price, PricingParameters};
use crate::types::*;
use crate::CrrResult;

/// Upper bound on sweep points per variable.
const MAX_SWEEP_POINTS: usize = 10_000;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A pricing parameter that can be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Spot,
    Strike,
    RiskFreeRate,
    Volatility,
    TimeToExpiry,
    Steps,
}

impl ParameterKind {
    fn apply(self, base: &PricingParameters, value: f64) -> CrrResult<PricingParameters> {
        let mut params = *base;
        match self {
            ParameterKind::Spot => params.spot = value,
            ParameterKind::Strike => params.strike = value,
            ParameterKind::RiskFreeRate => params.risk_free_rate = value,
            ParameterKind::Volatility => params.volatility = value,
            ParameterKind::TimeToExpiry => params.time_to_expiry = value,
            ParameterKind::Steps => {
                if value < 1.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
                    return Err(PricerError::InvalidInput {
                        field: "steps".into(),
                        reason: format!("sweep value {value} is not a positive integer"),
                    });
                }
                params.steps = value as u32;
            }
        }
        Ok(params)
    }

    fn base_value(self, base: &PricingParameters) -> f64 {
        match self {
            ParameterKind::Spot => base.spot,
            ParameterKind::Strike => base.strike,
            ParameterKind::RiskFreeRate => base.risk_free_rate,
            ParameterKind::Volatility => base.volatility,
            ParameterKind::TimeToExpiry => base.time_to_expiry,
            ParameterKind::Steps => f64::from(base.steps),
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::Spot => "spot",
            ParameterKind::Strike => "strike",
            ParameterKind::RiskFreeRate => "risk_free_rate",
            ParameterKind::Volatility => "volatility",
            ParameterKind::TimeToExpiry => "time_to_expiry",
            ParameterKind::Steps => "steps",
        };
        f.write_str(name)
    }
}

impl FromStr for ParameterKind {
    type Err = PricerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" | "s0" => Ok(ParameterKind::Spot),
            "strike" | "k" => Ok(ParameterKind::Strike),
            "risk_free_rate" | "rate" | "r" => Ok(ParameterKind::RiskFreeRate),
            "volatility" | "vol" | "sigma" => Ok(ParameterKind::Volatility),
            "time_to_expiry" | "time" | "t" => Ok(ParameterKind::TimeToExpiry),
            "steps" | "n" => Ok(ParameterKind::Steps),
            other => Err(PricerError::InvalidInput {
                field: "variable".into(),
                reason: format!("unknown parameter '{other}'"),
            }),
        }
    }
}

/// Sensitivity variable specification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: ParameterKind,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl FromStr for SensitivityVariable {
    type Err = PricerError;

    /// Parses `name:min:max:step`, e.g. `spot:80:120:5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(PricerError::InvalidInput {
                field: "variable".into(),
                reason: format!("expected name:min:max:step, got '{s}'"),
            });
        }
        let number = |field: &str, raw: &str| -> CrrResult<f64> {
            raw.trim().parse::<f64>().map_err(|e| PricerError::InvalidInput {
                field: format!("variable:{field}"),
                reason: format!("'{raw}' is not a number ({e})"),
            })
        };
        Ok(SensitivityVariable {
            name: parts[0].parse()?,
            min: number("min", parts[1])?,
            max: number("max", parts[2])?,
            step: number("step", parts[3])?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderInput {
    pub base: PricingParameters,
    pub variable: SensitivityVariable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderRow {
    pub value: f64,
    /// `None` when the engine rejected this point.
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderOutput {
    pub variable: ParameterKind,
    pub rows: Vec<LadderRow>,
}

/// Input for 2-way sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub base: PricingParameters,
    pub variable_1: SensitivityVariable,
    pub variable_2: SensitivityVariable,
}

/// Output of 2-way sensitivity analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1_name: ParameterKind,
    pub variable_2_name: ParameterKind,
    pub variable_1_values: Vec<f64>,
    pub variable_2_values: Vec<f64>,
    /// Matrix[i][j] = price when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j]
    pub matrix: Vec<Vec<Option<Price>>>,
    /// Price at the cell closest to the base parameters
    pub base_case_value: Option<Price>,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

// ---------------------------------------------------------------------------
// Sweep helpers
// ---------------------------------------------------------------------------

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> CrrResult<Vec<f64>> {
    let field = format!("variable:{}", var.name);
    if !(var.min.is_finite() && var.max.is_finite() && var.step.is_finite()) {
        return Err(PricerError::InvalidInput {
            field,
            reason: "Bounds and step must be finite".into(),
        });
    }
    if var.step <= 0.0 {
        return Err(PricerError::InvalidInput {
            field,
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(PricerError::InvalidInput {
            field,
            reason: "Min must be <= max".into(),
        });
    }

    let count = ((var.max - var.min) / var.step).floor() as usize + 1;
    if count > MAX_SWEEP_POINTS {
        return Err(PricerError::InvalidInput {
            field,
            reason: format!("Sweep has {count} points, limit is {MAX_SWEEP_POINTS}"),
        });
    }

    // Multiply rather than accumulate so 0.1-style steps do not drift.
    let mut values: Vec<f64> = (0..count).map(|i| var.min + i as f64 * var.step).collect();
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if var.max - last > var.step * 1e-9 {
            values.push(var.max);
        }
    }
    Ok(values)
}

/// Find the closest index to a target value.
fn closest_index(values: &[f64], target: f64) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn evaluate(
    base: &PricingParameters,
    points: &[(ParameterKind, f64)],
    warnings: &mut Vec<String>,
) -> Option<Price> {
    let result = points
        .iter()
        .try_fold(*base, |params, &(kind, value)| kind.apply(&params, value))
        .and_then(|params| price(&params));
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let at: Vec<String> = points.iter().map(|(k, v)| format!("{k}={v}")).collect();
            warnings.push(format!("Evaluation failed at ({}): {e}", at.join(", ")));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price the option across a one-variable sweep.
pub fn price_ladder(input: &LadderInput) -> CrrResult<ComputationOutput<LadderOutput>> {
    let start = Instant::now();
    input.base.validate()?;
    let mut warnings = Vec::new();

    let kind = input.variable.name;
    let rows: Vec<LadderRow> = generate_sweep_values(&input.variable)?
        .into_iter()
        .map(|value| LadderRow {
            value,
            price: evaluate(&input.base, &[(kind, value)], &mut warnings),
        })
        .collect();

    let output = LadderOutput {
        variable: kind,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "CRR price ladder",
        &serde_json::json!({
            "variable": kind,
            "base": input.base,
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Price the option on a two-variable grid.
pub fn sensitivity_grid(
    input: &SensitivityInput,
) -> CrrResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    input.base.validate()?;
    if input.variable_1.name == input.variable_2.name {
        return Err(PricerError::InvalidInput {
            field: "variable_2".into(),
            reason: format!("must differ from variable_1 ({})", input.variable_1.name),
        });
    }
    let mut warnings = Vec::new();

    let kind_1 = input.variable_1.name;
    let kind_2 = input.variable_2.name;
    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = generate_sweep_values(&input.variable_2)?;

    let mut matrix = Vec::with_capacity(v1_values.len());
    for &v1 in &v1_values {
        let row: Vec<Option<Price>> = v2_values
            .iter()
            .map(|&v2| evaluate(&input.base, &[(kind_1, v1), (kind_2, v2)], &mut warnings))
            .collect();
        matrix.push(row);
    }

    let base_row = closest_index(&v1_values, kind_1.base_value(&input.base));
    let base_col = closest_index(&v2_values, kind_2.base_value(&input.base));
    let base_case_value = matrix[base_row][base_col];

    let output = SensitivityOutput {
        variable_1_name: kind_1,
        variable_2_name: kind_2,
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-Way Sensitivity Analysis (CRR lattice)",
        &serde_json::json!({
            "variable_1": kind_1,
            "variable_2": kind_2,
            "base": input.base,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
