//! Static network registry and the mutable active-chain subset.
//!
//! The registry maps chain ids to immutable [`NetworkDescriptor`]s for the
//! lifetime of the process. Lookups of unknown ids return `None` and every
//! consumer treats that as "skip silently", never as a fault. The
//! user-chosen active subset is separate mutable state.

use chainblog_types::{ChainId, NetworkDescriptor, NetworkKind};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Immutable chain_id -> descriptor lookup, preserving configured order.
#[derive(Debug, Default)]
pub struct NetworkRegistry {
	networks: Vec<NetworkDescriptor>,
	index: HashMap<ChainId, usize>,
}

/// Aggregate counts for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
	pub total: usize,
	pub mainnets: usize,
	pub testnets: usize,
}

impl NetworkRegistry {
	/// Builds a registry from descriptors in configured order. A duplicate
	/// chain id keeps the first descriptor; the config layer rejects
	/// duplicates before they reach this point.
	pub fn new(networks: Vec<NetworkDescriptor>) -> Self {
		let mut index = HashMap::with_capacity(networks.len());
		for (position, network) in networks.iter().enumerate() {
			index.entry(network.chain_id).or_insert(position);
		}
		Self { networks, index }
	}

	pub fn get(&self, chain_id: ChainId) -> Option<&NetworkDescriptor> {
		self.index.get(&chain_id).map(|&position| &self.networks[position])
	}

	pub fn contains(&self, chain_id: ChainId) -> bool {
		self.index.contains_key(&chain_id)
	}

	/// Descriptors in configured order.
	pub fn iter(&self) -> impl Iterator<Item = &NetworkDescriptor> {
		self.networks.iter()
	}

	/// Chain ids flagged default-active, in configured order.
	pub fn default_active(&self) -> Vec<ChainId> {
		self.networks
			.iter()
			.filter(|network| network.default_active)
			.map(|network| network.chain_id)
			.collect()
	}

	pub fn stats(&self) -> RegistryStats {
		let mainnets = self
			.networks
			.iter()
			.filter(|network| network.kind == NetworkKind::Mainnet)
			.count();
		RegistryStats {
			total: self.networks.len(),
			mainnets,
			testnets: self.networks.len() - mainnets,
		}
	}

	pub fn len(&self) -> usize {
		self.networks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.networks.is_empty()
	}
}

/// The user-selected subset of registry chains queried by aggregate views.
///
/// Mutable, unlike the registry itself. The snapshot order is the order in
/// which chains were activated (seeding uses configured order), which is the
/// tie-break order of aggregate results.
#[derive(Debug, Default)]
pub struct ActiveNetworks {
	chains: RwLock<Vec<ChainId>>,
}

impl ActiveNetworks {
	pub fn new(chains: Vec<ChainId>) -> Self {
		Self {
			chains: RwLock::new(chains),
		}
	}

	/// Seeds the active set from the registry's default-active flags.
	pub fn seeded(registry: &NetworkRegistry) -> Self {
		Self::new(registry.default_active())
	}

	pub async fn snapshot(&self) -> Vec<ChainId> {
		self.chains.read().await.clone()
	}

	pub async fn is_active(&self, chain_id: ChainId) -> bool {
		self.chains.read().await.contains(&chain_id)
	}

	pub async fn activate(&self, chain_id: ChainId) {
		let mut chains = self.chains.write().await;
		if !chains.contains(&chain_id) {
			debug!(chain = %chain_id, "activating network");
			chains.push(chain_id);
		}
	}

	pub async fn deactivate(&self, chain_id: ChainId) {
		let mut chains = self.chains.write().await;
		chains.retain(|&active| active != chain_id);
	}

	pub async fn replace(&self, chains: Vec<ChainId>) {
		*self.chains.write().await = chains;
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chainblog_types::{AbiVersion, Address};

	fn descriptor(chain_id: u64, kind: NetworkKind, default_active: bool) -> NetworkDescriptor {
		NetworkDescriptor {
			chain_id: ChainId(chain_id),
			name: format!("net-{chain_id}"),
			contract: Address::ZERO,
			rpc_url: "https://rpc.example".into(),
			abi_version: AbiVersion::V5,
			kind,
			color: "#999999".into(),
			default_active,
		}
	}

	fn registry() -> NetworkRegistry {
		NetworkRegistry::new(vec![
			descriptor(100, NetworkKind::Mainnet, true),
			descriptor(204, NetworkKind::Mainnet, true),
			descriptor(0xa5bd, NetworkKind::Testnet, false),
		])
	}

	#[test]
	fn test_lookup_and_unknown_id() {
		let registry = registry();
		assert_eq!(registry.get(ChainId(100)).unwrap().name, "net-100");
		assert!(registry.get(ChainId(1)).is_none());
		assert!(!registry.contains(ChainId(1)));
	}

	#[test]
	fn test_stats() {
		assert_eq!(
			registry().stats(),
			RegistryStats {
				total: 3,
				mainnets: 2,
				testnets: 1
			}
		);
	}

	#[test]
	fn test_default_active_preserves_configured_order() {
		assert_eq!(
			registry().default_active(),
			vec![ChainId(100), ChainId(204)]
		);
	}

	#[tokio::test]
	async fn test_active_set_toggle() {
		let active = ActiveNetworks::seeded(&registry());
		assert_eq!(active.snapshot().await, vec![ChainId(100), ChainId(204)]);

		active.activate(ChainId(0xa5bd)).await;
		active.activate(ChainId(0xa5bd)).await; // idempotent
		assert_eq!(
			active.snapshot().await,
			vec![ChainId(100), ChainId(204), ChainId(0xa5bd)]
		);

		active.deactivate(ChainId(204)).await;
		assert!(!active.is_active(ChainId(204)).await);
		assert_eq!(
			active.snapshot().await,
			vec![ChainId(100), ChainId(0xa5bd)]
		);
	}
}
