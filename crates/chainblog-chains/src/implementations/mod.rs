//! Concrete chain reader implementations.

pub mod alloy;
