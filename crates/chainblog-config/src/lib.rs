//! Configuration loading for the chainblog workspace.
//!
//! The configuration file carries the network registry table plus a handful
//! of session/read defaults. Loading supports `${ENV_VAR}` substitution and
//! environment overrides, and validation rejects tables that would later
//! surface as silent per-chain failures (duplicate ids, unparseable
//! contract addresses, non-HTTP RPC endpoints).

pub mod loader;
pub mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{Config, NetworkEntry, SessionDefaults};
