//! Concrete wallet implementations.

pub mod local;
