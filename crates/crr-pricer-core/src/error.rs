use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricerError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Degenerate lattice: up factor {up} equals down factor {down}")]
    DegenerateLattice { up: f64, down: f64 },

    #[error("Numerical instability in {context}")]
    NumericalInstability { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PricerError {
    pub(crate) fn invalid(field: &str, reason: &str) -> Self {
        PricerError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PricerError {
    fn from(e: serde_json::Error) -> Self {
        PricerError::SerializationError(e.to_string())
    }
}
