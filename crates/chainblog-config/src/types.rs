//! Typed configuration structures.

use chainblog_types::{AbiVersion, ChainId, NetworkDescriptor, NetworkKind};
use serde::Deserialize;
use std::str::FromStr;

use crate::loader::ConfigError;

/// Root configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub session: SessionDefaults,
	pub networks: Vec<NetworkEntry>,
}

/// Tunables for session and aggregate reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
	/// Confirmations to await after a write.
	pub confirmations: u64,
	pub explore_page_size: u64,
	pub gallery_page_size: u64,
	pub history_page_size: u64,
}

impl Default for SessionDefaults {
	fn default() -> Self {
		Self {
			confirmations: 1,
			explore_page_size: 6,
			gallery_page_size: 12,
			history_page_size: 10,
		}
	}
}

/// One `[[networks]]` table entry.
///
/// `chain_id` is kept as a string so both the wallet-style hex form and
/// plain decimal are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkEntry {
	pub chain_id: String,
	pub name: String,
	pub contract: String,
	pub rpc_url: String,
	#[serde(default)]
	pub abi_version: AbiVersion,
	#[serde(default)]
	pub kind: NetworkKind,
	#[serde(default)]
	pub color: String,
	#[serde(default)]
	pub default: bool,
}

impl NetworkEntry {
	pub fn to_descriptor(&self) -> Result<NetworkDescriptor, ConfigError> {
		let chain_id = ChainId::from_str(&self.chain_id).map_err(|_| {
			ConfigError::Validation(format!(
				"network `{}` has invalid chain_id `{}`",
				self.name, self.chain_id
			))
		})?;
		let contract = self.contract.parse().map_err(|_| {
			ConfigError::Validation(format!(
				"network `{}` has invalid contract address `{}`",
				self.name, self.contract
			))
		})?;

		Ok(NetworkDescriptor {
			chain_id,
			name: self.name.clone(),
			contract,
			rpc_url: self.rpc_url.clone(),
			abi_version: self.abi_version,
			kind: self.kind,
			color: self.color.clone(),
			default_active: self.default,
		})
	}
}

impl Config {
	/// Converts the network table into registry descriptors, preserving
	/// file order.
	pub fn descriptors(&self) -> Result<Vec<NetworkDescriptor>, ConfigError> {
		self.networks
			.iter()
			.map(NetworkEntry::to_descriptor)
			.collect()
	}
}
