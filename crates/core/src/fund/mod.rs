//! Funds and derived fund rollups.

pub mod types;

pub use types::{Fund, FundRollup};
