//! Core domain types and logic.

pub mod position;
pub mod ledger;
pub mod trade;
pub mod prices;
pub mod planner;
pub mod simulation;
pub mod metrics;
pub mod config_validation;
pub mod error;
