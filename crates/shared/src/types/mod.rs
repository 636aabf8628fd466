//! Common types used across the application.

pub mod id;
pub mod rounding;

pub use id::*;
pub use rounding::{round_money, round_unit_price};
