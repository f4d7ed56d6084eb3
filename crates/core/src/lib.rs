//! Core business logic for the Fiscus budget ledger.
//!
//! This crate contains the pure domain logic of the engine:
//! - Budget line figures, derived balances, and monthly allocation schedules
//! - The transfer/supplemental engine producing validated ledger deltas
//! - The shared document approval state machine
//! - Read-only query, summary, and fund rollup calculations
//!
//! It has zero web and zero database dependencies; persistence and HTTP
//! live in `fiscus-db` and `fiscus-api`.

pub mod document;
pub mod engine;
pub mod fund;
pub mod ledger;
pub mod query;
pub mod workflow;
