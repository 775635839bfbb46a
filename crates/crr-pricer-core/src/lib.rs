pub mod error;
pub mod lattice;
pub mod types;

#[cfg(feature = "analytics")]
pub mod analytics;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use error::PricerError;

pub type CrrResult<T> = Result<T, PricerError>;
