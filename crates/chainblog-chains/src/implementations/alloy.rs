//! Alloy-based HTTP reader implementation.
//!
//! One lazily-built provider per chain, keyed by chain id and shared across
//! calls. Providers talk to the descriptor's own RPC endpoint; no wallet is
//! involved on the read path.

use crate::{ChainError, ChainReader};
use alloy::contract::Error as ContractError;
use alloy::primitives::U256;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use chainblog_contracts::{format_post, ChainBlogV5, ChainBlogV6, RawPost};
use chainblog_types::{AbiVersion, Address, ChainId, NetworkDescriptor, Post, UserRecord};
use dashmap::DashMap;
use tracing::{debug, trace};

/// Read-only RPC client over per-chain alloy providers.
#[derive(Default)]
pub struct AlloyReader {
	providers: DashMap<ChainId, DynProvider>,
}

impl AlloyReader {
	pub fn new() -> Self {
		Self::default()
	}

	fn provider(&self, network: &NetworkDescriptor) -> Result<DynProvider, ChainError> {
		if let Some(existing) = self.providers.get(&network.chain_id) {
			return Ok(existing.clone());
		}

		let url = network
			.rpc_url
			.parse()
			.map_err(|_| ChainError::InvalidUrl(network.rpc_url.clone()))?;
		let provider = ProviderBuilder::new().connect_http(url).erased();

		debug!(chain = %network.chain_id, rpc = %network.rpc_url, "created read provider");
		self.providers.insert(network.chain_id, provider.clone());
		Ok(provider)
	}
}

fn call_error(err: ContractError) -> ChainError {
	match err {
		ContractError::TransportError(e) => ChainError::Rpc(e.to_string()),
		other => ChainError::Call(other.to_string()),
	}
}

fn clamp_u64(value: U256) -> u64 {
	u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl ChainReader for AlloyReader {
	async fn paginated_posts(
		&self,
		network: &NetworkDescriptor,
		page: u64,
		page_size: u64,
	) -> Result<Vec<Post>, ChainError> {
		let provider = self.provider(network)?;
		trace!(chain = %network.chain_id, page, page_size, "fetching paginated posts");

		let raw: Vec<RawPost> = match network.abi_version {
			AbiVersion::V5 => ChainBlogV5::new(network.contract, provider)
				.getPaginatedPosts(U256::from(page), U256::from(page_size))
				.call()
				.await
				.map_err(call_error)?
				.into_iter()
				.map(RawPost::from)
				.collect(),
			AbiVersion::V6 => ChainBlogV6::new(network.contract, provider)
				.getPaginatedPosts(U256::from(page), U256::from(page_size))
				.call()
				.await
				.map_err(call_error)?
				.into_iter()
				.map(RawPost::from)
				.collect(),
		};

		Ok(raw
			.into_iter()
			.map(|row| format_post(row, network.chain_id, network.abi_version))
			.collect())
	}

	async fn post(&self, network: &NetworkDescriptor, id: u64) -> Result<Post, ChainError> {
		let provider = self.provider(network)?;

		let raw: RawPost = match network.abi_version {
			AbiVersion::V5 => ChainBlogV5::new(network.contract, provider)
				.posts(U256::from(id))
				.call()
				.await
				.map_err(call_error)?
				.into(),
			AbiVersion::V6 => ChainBlogV6::new(network.contract, provider)
				.posts(U256::from(id))
				.call()
				.await
				.map_err(call_error)?
				.into(),
		};

		Ok(format_post(raw, network.chain_id, network.abi_version))
	}

	async fn post_ids(
		&self,
		network: &NetworkDescriptor,
		author: Address,
	) -> Result<Vec<u64>, ChainError> {
		let provider = self.provider(network)?;
		let ids = ChainBlogV5::new(network.contract, provider)
			.getPostIdsByAddress(author)
			.call()
			.await
			.map_err(call_error)?;
		Ok(ids.into_iter().map(clamp_u64).collect())
	}

	async fn post_count(&self, network: &NetworkDescriptor) -> Result<u64, ChainError> {
		let provider = self.provider(network)?;
		let count = ChainBlogV5::new(network.contract, provider)
			.getPostCount()
			.call()
			.await
			.map_err(call_error)?;
		Ok(clamp_u64(count))
	}

	async fn user(
		&self,
		network: &NetworkDescriptor,
		address: Address,
	) -> Result<UserRecord, ChainError> {
		let provider = self.provider(network)?;
		let record = ChainBlogV5::new(network.contract, provider)
			.users(address)
			.call()
			.await
			.map_err(call_error)?;

		Ok(UserRecord {
			address,
			username: record.username,
			is_banned: record.isBanned,
			is_registered: record.isRegistered,
		})
	}

	async fn owner(&self, network: &NetworkDescriptor) -> Result<Address, ChainError> {
		let provider = self.provider(network)?;
		ChainBlogV5::new(network.contract, provider)
			.owner()
			.call()
			.await
			.map_err(call_error)
	}

	async fn user_count(&self, network: &NetworkDescriptor) -> Result<u64, ChainError> {
		let provider = self.provider(network)?;
		let count = ChainBlogV5::new(network.contract, provider)
			.getUserCount()
			.call()
			.await
			.map_err(call_error)?;
		Ok(clamp_u64(count))
	}

	async fn registered_user(
		&self,
		network: &NetworkDescriptor,
		index: u64,
	) -> Result<Address, ChainError> {
		let provider = self.provider(network)?;
		ChainBlogV5::new(network.contract, provider)
			.allRegisteredUsers(U256::from(index))
			.call()
			.await
			.map_err(call_error)
	}
}
