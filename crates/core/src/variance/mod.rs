//! Actual vs. estimated variance computation.

pub mod calculator;

pub use calculator::{Variance, VarianceCalculator};
