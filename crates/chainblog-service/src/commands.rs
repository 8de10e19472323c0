//! Command handlers: read flows over the aggregation engine, write flows
//! through a key-backed session.

use crate::App;
use anyhow::{Context, Result};
use chainblog_session::SessionController;
use chainblog_types::{Address, ChainId, DeepLink, Post, PostDraft, Timestamp, TransactionReceipt};
use chainblog_wallet::LocalWallet;
use chrono::DateTime;
use std::sync::Arc;
use tracing::info;

/// Builds a connected session with the wallet already on the target chain.
///
/// A key-backed wallet is always authorized, so the explicit `connect` path
/// is used; silent restoration only matters for wallets that can revoke
/// authorization between runs.
pub async fn open_session(
	app: &App,
	private_key: &Option<String>,
	chain: ChainId,
) -> Result<Arc<SessionController>> {
	let key = private_key
		.as_deref()
		.context("A private key is required; set CHAINBLOG_PRIVATE_KEY or pass --private-key")?;

	let wallet = LocalWallet::new(key, chain, &app.registry, app.config.session.confirmations)
		.context("Failed to open wallet")?;
	let session = Arc::new(SessionController::new(
		app.registry.clone(),
		Arc::new(wallet),
		app.reader.clone(),
	));
	tokio::spawn(session.clone().run_event_loop());

	session.connect().await.context("Failed to connect wallet")?;
	session
		.switch_chain(chain)
		.await
		.context("Failed to select chain")?;
	Ok(session)
}

fn format_timestamp(timestamp: Timestamp) -> String {
	DateTime::from_timestamp(timestamp as i64, 0)
		.map(|moment| moment.format("%Y-%m-%d %H:%M").to_string())
		.unwrap_or_else(|| timestamp.to_string())
}

fn print_post_line(post: &Post) {
	println!(
		"{} #{:<4} {}  by {} ({})",
		post.chain_id,
		post.id,
		format_timestamp(post.created_at),
		post.author_name,
		post.author
	);
	println!("    {}", post.title);
}

fn print_posts(posts: &[Post], json: bool) -> Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(posts)?);
		return Ok(());
	}
	if posts.is_empty() {
		println!("No posts.");
		return Ok(());
	}
	for post in posts {
		print_post_line(post);
	}
	Ok(())
}

fn print_receipt(receipt: &TransactionReceipt) {
	if receipt.success {
		info!(
			tx_hash = %receipt.hash,
			block = receipt.block_number,
			"transaction confirmed"
		);
	} else {
		info!(
			tx_hash = %receipt.hash,
			block = receipt.block_number,
			"transaction reverted"
		);
	}
}

pub fn networks(app: &App, json: bool) -> Result<()> {
	if json {
		let all: Vec<_> = app.registry.iter().collect();
		println!("{}", serde_json::to_string_pretty(&all)?);
		return Ok(());
	}

	let stats = app.registry.stats();
	println!(
		"{} networks ({} mainnet, {} testnet):",
		stats.total, stats.mainnets, stats.testnets
	);
	for network in app.registry.iter() {
		println!(
			"  {} {:<16} {:?} {:?} contract {}{}",
			network.chain_id,
			network.name,
			network.abi_version,
			network.kind,
			network.contract,
			if network.default_active { "  [active]" } else { "" }
		);
	}
	Ok(())
}

pub async fn explore(
	app: &App,
	chains: &[ChainId],
	page: u64,
	size: u64,
	json: bool,
) -> Result<()> {
	let posts = app.engine.list_explore(chains, page, size).await;
	print_posts(&posts, json)
}

pub async fn gallery(
	app: &App,
	chains: &[ChainId],
	page: u64,
	size: u64,
	json: bool,
) -> Result<()> {
	let entries = app.engine.list_gallery(chains, page, size).await;
	if json {
		println!("{}", serde_json::to_string_pretty(&entries)?);
		return Ok(());
	}
	if entries.is_empty() {
		println!("No gallery posts.");
		return Ok(());
	}
	for entry in &entries {
		print_post_line(&entry.post);
		println!("    image: {}", entry.image_url);
	}
	Ok(())
}

pub async fn history(
	app: &App,
	address: Address,
	chain: ChainId,
	page: u64,
	size: u64,
	json: bool,
) -> Result<()> {
	let posts = app.engine.list_history(address, chain, page, size).await;
	print_posts(&posts, json)
}

fn print_post_detail(post: &Post, json: bool) -> Result<()> {
	if json {
		println!("{}", serde_json::to_string_pretty(post)?);
		return Ok(());
	}
	println!("{}", post.title);
	println!(
		"{} #{} by {} ({})",
		post.chain_id, post.id, post.author_name, post.author
	);
	println!(
		"created {}  updated {}",
		format_timestamp(post.created_at),
		format_timestamp(post.updated_at)
	);
	if post.has_cover() {
		println!("cover: {}", post.cover_image_url);
	}
	println!();
	println!("{}", post.content);
	println!();
	println!("share: {}", DeepLink::new(post.chain_id, post.id));
	Ok(())
}

pub async fn show(app: &App, chain: ChainId, id: u64, json: bool) -> Result<()> {
	match app.engine.resolve_deep_link(chain, id).await {
		Some(post) => print_post_detail(&post, json),
		None => {
			println!("Post {} #{} not found.", chain, id);
			Ok(())
		}
	}
}

pub async fn link(app: &App, url: &str, json: bool) -> Result<()> {
	let target = DeepLink::parse(url).context("Unrecognized post link")?;
	match app
		.engine
		.resolve_deep_link(target.chain_id, target.post_id)
		.await
	{
		Some(post) => print_post_detail(&post, json),
		None => {
			println!(
				"Post {} #{} not found.",
				target.chain_id, target.post_id
			);
			Ok(())
		}
	}
}

pub async fn users(app: &App, chain: ChainId, limit: u64, json: bool) -> Result<()> {
	let roster = app.engine.list_users(chain, limit).await;
	if json {
		println!("{}", serde_json::to_string_pretty(&roster)?);
		return Ok(());
	}
	if roster.is_empty() {
		println!("No registered users.");
		return Ok(());
	}
	for user in &roster {
		println!(
			"{:<24} {}{}",
			user.username,
			user.address,
			if user.is_banned { "  [banned]" } else { "" }
		);
	}
	Ok(())
}

pub async fn register(session: &SessionController, username: &str) -> Result<()> {
	let receipt = session.register(username).await?;
	print_receipt(&receipt);
	let status = session.status().await;
	println!(
		"Registered as `{}` (registered: {})",
		status.username, status.is_registered
	);
	Ok(())
}

fn draft(title: &str, content: &str, cover: Option<String>) -> PostDraft {
	let mut draft = PostDraft::new(title, content);
	draft.cover_image_url = cover;
	draft
}

pub async fn create_post(
	session: &SessionController,
	title: &str,
	content: &str,
	cover: Option<String>,
) -> Result<()> {
	let receipt = session.create_post(&draft(title, content, cover)).await?;
	print_receipt(&receipt);
	println!("Post published.");
	Ok(())
}

pub async fn update_post(
	session: &SessionController,
	chain: ChainId,
	id: u64,
	title: &str,
	content: &str,
	cover: Option<String>,
) -> Result<()> {
	let receipt = session
		.update_post(chain, id, &draft(title, content, cover))
		.await?;
	print_receipt(&receipt);
	println!("Post {} #{} updated.", chain, id);
	Ok(())
}

pub async fn delete_post(session: &SessionController, chain: ChainId, id: u64) -> Result<()> {
	let receipt = session.delete_post(chain, id).await?;
	print_receipt(&receipt);
	println!("Post {} #{} deleted.", chain, id);
	Ok(())
}

pub async fn set_banned(
	session: &SessionController,
	address: Address,
	banned: bool,
) -> Result<()> {
	let receipt = session.set_banned(address, banned).await?;
	print_receipt(&receipt);
	println!(
		"{} is now {}.",
		address,
		if banned { "banned" } else { "unbanned" }
	);
	Ok(())
}
