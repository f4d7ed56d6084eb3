//! Transfer and supplemental engine: validated ledger deltas.

pub mod service;

#[cfg(test)]
mod props;

pub use service::TransferEngine;
