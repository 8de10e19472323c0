//! Multi-chain aggregation engine.
//!
//! Fans list/read queries out across the active chains, one task per chain
//! against that chain's own RPC endpoint, and joins the full result set
//! before a single merge/sort. A slow or dead chain degrades only its own
//! contribution; the aggregate never fails and never emits incrementally,
//! since final ordering needs the complete result set.

use chainblog_chains::ChainReader;
use chainblog_contracts::first_markdown_image;
use chainblog_registry::NetworkRegistry;
use chainblog_types::{AbiVersion, Address, ChainId, GalleryPost, Post, UserRecord};
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

/// Aggregates reads across every chain in the caller-supplied active set.
pub struct AggregationEngine {
	registry: Arc<NetworkRegistry>,
	reader: Arc<dyn ChainReader>,
}

impl AggregationEngine {
	pub fn new(registry: Arc<NetworkRegistry>, reader: Arc<dyn ChainReader>) -> Self {
		Self { registry, reader }
	}

	/// One chain's contribution to an aggregate page: its own paginated
	/// read, ghosts filtered out. Unknown chain ids and per-chain failures
	/// contribute an empty set, never an error.
	async fn chain_page(&self, chain_id: ChainId, page: u64, page_size: u64) -> Vec<Post> {
		let Some(network) = self.registry.get(chain_id) else {
			debug!(chain = %chain_id, "chain not in registry, skipping");
			return Vec::new();
		};

		match self.reader.paginated_posts(network, page, page_size).await {
			Ok(posts) => posts.into_iter().filter(|post| post.exists).collect(),
			Err(err) => {
				debug!(chain = %chain_id, %err, "chain page failed, degrading to empty");
				Vec::new()
			}
		}
	}

	/// Aggregate explore feed: every active chain queried independently,
	/// results concatenated and stably sorted by `created_at` descending.
	/// Ties keep the input (active-set) order.
	pub async fn list_explore(
		&self,
		active_chain_ids: &[ChainId],
		page: u64,
		page_size: u64,
	) -> Vec<Post> {
		let pages = join_all(
			active_chain_ids
				.iter()
				.map(|&chain_id| self.chain_page(chain_id, page, page_size)),
		)
		.await;

		let mut posts: Vec<Post> = pages.into_iter().flatten().collect();
		posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
		posts
	}

	/// Gallery feed over the V6 subset of the active chains. The image is
	/// the explicit cover when present, otherwise the first markdown image
	/// reference in the content; posts with neither are excluded.
	pub async fn list_gallery(
		&self,
		active_chain_ids: &[ChainId],
		page: u64,
		page_size: u64,
	) -> Vec<GalleryPost> {
		let v6_chains: Vec<ChainId> = active_chain_ids
			.iter()
			.copied()
			.filter(|&chain_id| {
				self.registry
					.get(chain_id)
					.map(|network| network.abi_version == AbiVersion::V6)
					.unwrap_or(false)
			})
			.collect();

		let pages = join_all(
			v6_chains
				.iter()
				.map(|&chain_id| self.chain_page(chain_id, page, page_size)),
		)
		.await;

		let mut gallery: Vec<GalleryPost> = pages
			.into_iter()
			.flatten()
			.filter_map(|post| {
				let image_url = if post.has_cover() {
					Some(post.cover_image_url.clone())
				} else {
					first_markdown_image(&post.content).map(str::to_owned)
				};
				image_url.map(|image_url| GalleryPost { post, image_url })
			})
			.collect();

		gallery.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
		gallery
	}

	/// One author's posts on one chain, newest id first. The owned id list
	/// is fetched once, the requested window sliced from it, and the window
	/// resolved concurrently; ids that fail to resolve are dropped, so the
	/// page may be shorter than `page_size`.
	pub async fn list_history(
		&self,
		address: Address,
		chain_id: ChainId,
		page: u64,
		page_size: u64,
	) -> Vec<Post> {
		let Some(network) = self.registry.get(chain_id) else {
			debug!(chain = %chain_id, "chain not in registry, skipping history");
			return Vec::new();
		};

		let mut ids = match self.reader.post_ids(network, address).await {
			Ok(ids) => ids,
			Err(err) => {
				debug!(chain = %chain_id, %err, "owned id list failed, degrading to empty");
				return Vec::new();
			}
		};
		ids.reverse();

		let start = page.saturating_sub(1).saturating_mul(page_size) as usize;
		let window: Vec<u64> = ids
			.into_iter()
			.skip(start)
			.take(page_size as usize)
			.collect();

		let resolved = join_all(window.iter().map(|&id| self.reader.post(network, id))).await;

		resolved
			.into_iter()
			.filter_map(|outcome| match outcome {
				Ok(post) if post.exists => Some(post),
				Ok(_) => None,
				Err(err) => {
					debug!(chain = %chain_id, %err, "post resolution failed, dropping entry");
					None
				}
			})
			.collect()
	}

	/// Resolves a shared deep link to its post. Unknown chain, ghost record,
	/// or any read failure is a not-found outcome; this path runs before any
	/// UI exists, so it never raises.
	pub async fn resolve_deep_link(&self, chain_id: ChainId, id: u64) -> Option<Post> {
		let network = self.registry.get(chain_id)?;

		match self.reader.post(network, id).await {
			Ok(post) if post.exists => Some(post),
			Ok(_) => None,
			Err(err) => {
				debug!(chain = %chain_id, id, %err, "deep link resolution failed");
				None
			}
		}
	}

	/// Most recently registered users on one chain, newest registration
	/// first, at most `limit` entries. Entries whose reads fail are dropped.
	pub async fn list_users(&self, chain_id: ChainId, limit: u64) -> Vec<UserRecord> {
		let Some(network) = self.registry.get(chain_id) else {
			return Vec::new();
		};

		let total = match self.reader.user_count(network).await {
			Ok(total) => total,
			Err(err) => {
				debug!(chain = %chain_id, %err, "user count failed, degrading to empty");
				return Vec::new();
			}
		};

		let floor = total.saturating_sub(limit);
		let mut users = Vec::new();
		for index in (floor..total).rev() {
			let address = match self.reader.registered_user(network, index).await {
				Ok(address) => address,
				Err(err) => {
					debug!(chain = %chain_id, index, %err, "user index read failed, dropping");
					continue;
				}
			};
			match self.reader.user(network, address).await {
				Ok(record) => users.push(record),
				Err(err) => {
					debug!(chain = %chain_id, %address, %err, "user record read failed, dropping");
				}
			}
		}
		users
	}
}
