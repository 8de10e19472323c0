//! Read-only chain access for the chainblog system.
//!
//! Every aggregate/read flow goes through the [`ChainReader`] capability
//! trait, one method per contract view. Each call targets the descriptor's
//! own RPC endpoint, independent of whatever chain a wallet currently has
//! selected, so a dead chain only ever degrades its own contribution.
//! The trait is the substitution seam for tests.

use async_trait::async_trait;
use chainblog_types::{Address, NetworkDescriptor, Post, UserRecord};
use thiserror::Error;

pub mod implementations;

pub use implementations::alloy::AlloyReader;

#[derive(Debug, Error)]
pub enum ChainError {
	#[error("rpc transport error: {0}")]
	Rpc(String),
	#[error("contract call failed: {0}")]
	Call(String),
	#[error("invalid rpc url `{0}`")]
	InvalidUrl(String),
}

/// Read-only RPC surface of one chain's contract deployment.
///
/// All methods return already-normalized records; implementations own the
/// version dispatch and tuple formatting.
#[async_trait]
pub trait ChainReader: Send + Sync {
	/// `getPaginatedPosts(page, pageSize)`, normalized. Includes ghost
	/// records; callers filter on `exists`.
	async fn paginated_posts(
		&self,
		network: &NetworkDescriptor,
		page: u64,
		page_size: u64,
	) -> Result<Vec<Post>, ChainError>;

	/// `posts(id)` storage read, normalized.
	async fn post(&self, network: &NetworkDescriptor, id: u64) -> Result<Post, ChainError>;

	/// `getPostIdsByAddress(author)`, oldest-first as stored on chain.
	async fn post_ids(
		&self,
		network: &NetworkDescriptor,
		author: Address,
	) -> Result<Vec<u64>, ChainError>;

	/// `getPostCount()`.
	async fn post_count(&self, network: &NetworkDescriptor) -> Result<u64, ChainError>;

	/// `users(address)` record.
	async fn user(
		&self,
		network: &NetworkDescriptor,
		address: Address,
	) -> Result<UserRecord, ChainError>;

	/// `owner()`.
	async fn owner(&self, network: &NetworkDescriptor) -> Result<Address, ChainError>;

	/// `getUserCount()`.
	async fn user_count(&self, network: &NetworkDescriptor) -> Result<u64, ChainError>;

	/// `allRegisteredUsers(index)`.
	async fn registered_user(
		&self,
		network: &NetworkDescriptor,
		index: u64,
	) -> Result<Address, ChainError>;
}
