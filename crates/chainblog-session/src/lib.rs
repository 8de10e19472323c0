//! Session state machine over wallet, chain, and derived user status.
//!
//! Two states, Disconnected and Connected, with orthogonal sub-attributes
//! (registered, banned, owner) that are re-derived from the active chain's
//! contract after every transition, never optimistically mutated. Write
//! operations are gated by advisory preconditions only; the contract remains
//! the actual authority.

use chainblog_chains::ChainReader;
use chainblog_contracts::ChainAdapter;
use chainblog_registry::NetworkRegistry;
use chainblog_types::{
	Address, ChainId, NetworkDescriptor, PostDraft, Transaction, TransactionReceipt, UserStatus,
	WalletSession, U256,
};
use chainblog_wallet::{WalletError, WalletEvent, WalletInterface};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
	#[error("wallet is not connected")]
	NotConnected,
	#[error("wallet has no chain selected")]
	NoActiveChain,
	#[error("chain {0} is not in the network registry")]
	UnknownChain(ChainId),
	#[error("account is not registered on the active chain")]
	NotRegistered,
	#[error("account is banned on the active chain")]
	Banned,
	#[error("operation requires the contract owner")]
	NotOwner,
	#[error("post lives on chain {post_chain}, wallet is on {active_chain}")]
	WrongChain {
		post_chain: ChainId,
		active_chain: ChainId,
	},
	#[error(transparent)]
	Wallet(#[from] WalletError),
}

#[derive(Debug, Clone, Default)]
struct SessionState {
	session: WalletSession,
	status: UserStatus,
}

/// Gates writes on wallet/chain/registration state and keeps the derived
/// status in sync with the active chain.
pub struct SessionController {
	registry: Arc<NetworkRegistry>,
	wallet: Arc<dyn WalletInterface>,
	reader: Arc<dyn ChainReader>,
	state: RwLock<SessionState>,
}

impl SessionController {
	pub fn new(
		registry: Arc<NetworkRegistry>,
		wallet: Arc<dyn WalletInterface>,
		reader: Arc<dyn ChainReader>,
	) -> Self {
		Self {
			registry,
			wallet,
			reader,
			state: RwLock::new(SessionState::default()),
		}
	}

	/// Explicit account authorization; Disconnected -> Connected on a
	/// non-empty account list.
	pub async fn connect(&self) -> Result<WalletSession, SessionError> {
		let accounts = self.wallet.request_accounts().await?;
		self.apply_accounts(accounts).await;
		Ok(self.session().await)
	}

	/// Silent restoration of a previously authorized account at startup.
	/// Never fails the session: a wallet error is treated as no accounts.
	pub async fn restore(&self) -> WalletSession {
		let accounts = self.wallet.accounts().await.unwrap_or_default();
		self.apply_accounts(accounts).await;
		self.session().await
	}

	/// Wallet reported a new account list. Zero accounts disconnects.
	pub async fn handle_accounts_changed(&self, accounts: Vec<Address>) {
		self.apply_accounts(accounts).await;
	}

	/// Wallet switched chains: every sub-attribute is invalidated and
	/// re-derived for the new chain.
	pub async fn handle_chain_changed(&self, chain_id: ChainId) {
		{
			let mut state = self.state.write().await;
			if !state.session.connected {
				return;
			}
			state.session.chain_id = Some(chain_id);
			state.status = UserStatus::default();
		}
		self.derive_status().await;
	}

	async fn apply_accounts(&self, accounts: Vec<Address>) {
		match accounts.first() {
			None => {
				info!("wallet reported zero accounts, disconnecting");
				let mut state = self.state.write().await;
				*state = SessionState::default();
			}
			Some(&address) => {
				let chain_id = self.wallet.chain_id().await.ok();
				{
					let mut state = self.state.write().await;
					state.session = WalletSession {
						address: Some(address),
						chain_id,
						connected: true,
					};
					state.status = UserStatus::default();
				}
				self.derive_status().await;
			}
		}
	}

	/// Re-derives the sub-attributes from the active chain with a read-only
	/// (user record, owner address) call. An unreachable or absent contract
	/// degrades to the default unregistered/not-banned/not-owner status
	/// rather than failing the session.
	async fn derive_status(&self) {
		let (address, chain_id) = {
			let state = self.state.read().await;
			if !state.session.connected {
				return;
			}
			match (state.session.address, state.session.chain_id) {
				(Some(address), Some(chain_id)) => (address, chain_id),
				_ => return,
			}
		};

		let status = match self.registry.get(chain_id) {
			None => {
				debug!(chain = %chain_id, "active chain not in registry, status defaults");
				UserStatus::default()
			}
			Some(network) => {
				let user = self.reader.user(network, address).await;
				let owner = self.reader.owner(network).await;
				match (user, owner) {
					(Ok(user), Ok(owner)) => UserStatus {
						is_registered: user.is_registered,
						username: user.username,
						is_banned: user.is_banned,
						is_owner: owner == address,
					},
					(user, owner) => {
						// Indistinguishable from a genuinely unregistered
						// user; logged so operators can tell.
						debug!(
							chain = %chain_id,
							user_ok = user.is_ok(),
							owner_ok = owner.is_ok(),
							"status derivation failed, degrading to defaults"
						);
						UserStatus::default()
					}
				}
			}
		};

		let mut state = self.state.write().await;
		// The session may have moved on while the reads were in flight;
		// stale derivations must not leak across accounts or chains.
		if state.session.address == Some(address) && state.session.chain_id == Some(chain_id) {
			state.status = status;
		}
	}

	/// Requests a wallet chain switch. On an unknown-chain failure the chain
	/// is added from registry data and the switch retried once.
	pub async fn switch_chain(&self, chain_id: ChainId) -> Result<(), SessionError> {
		match self.wallet.switch_chain(chain_id).await {
			Ok(()) => {}
			Err(WalletError::UnknownChain(_)) => {
				let network = self
					.registry
					.get(chain_id)
					.ok_or(SessionError::UnknownChain(chain_id))?;
				self.wallet.add_chain(network).await?;
				self.wallet.switch_chain(chain_id).await?;
			}
			Err(err) => return Err(err.into()),
		}
		self.handle_chain_changed(chain_id).await;
		Ok(())
	}

	/// Consumes wallet-initiated events until the wallet's event channel
	/// closes. Account and chain changes made outside the session (another
	/// dapp tab, the wallet UI itself) only reach the session while this
	/// loop is running; spawn it once after construction.
	pub async fn run_event_loop(self: Arc<Self>) {
		use tokio::sync::broadcast::error::RecvError;

		let mut events = self.wallet.subscribe();
		loop {
			match events.recv().await {
				Ok(WalletEvent::AccountsChanged(accounts)) => {
					self.handle_accounts_changed(accounts).await;
				}
				Ok(WalletEvent::ChainChanged(chain_id)) => {
					self.handle_chain_changed(chain_id).await;
				}
				Err(RecvError::Lagged(skipped)) => {
					// Missed transitions; the current wallet state is still
					// readable, so resync instead of replaying.
					warn!(skipped, "wallet event stream lagged, resyncing session");
					let accounts = self.wallet.accounts().await.unwrap_or_default();
					self.apply_accounts(accounts).await;
				}
				Err(RecvError::Closed) => break,
			}
		}
	}

	pub async fn session(&self) -> WalletSession {
		self.state.read().await.session.clone()
	}

	pub async fn status(&self) -> UserStatus {
		self.state.read().await.status.clone()
	}

	async fn active_network(&self) -> Result<NetworkDescriptor, SessionError> {
		let session = self.session().await;
		if !session.connected {
			return Err(SessionError::NotConnected);
		}
		let chain_id = session.chain_id.ok_or(SessionError::NoActiveChain)?;
		self.registry
			.get(chain_id)
			.cloned()
			.ok_or(SessionError::UnknownChain(chain_id))
	}

	/// Advisory gate for post-authoring writes.
	async fn require_author(&self) -> Result<(), SessionError> {
		let status = self.status().await;
		if !status.is_registered {
			return Err(SessionError::NotRegistered);
		}
		if status.is_banned {
			return Err(SessionError::Banned);
		}
		Ok(())
	}

	/// Submits a prepared call and awaits confirmation. Strictly sequential:
	/// no concurrent submission is modeled.
	async fn send(
		&self,
		network: &NetworkDescriptor,
		data: Vec<u8>,
	) -> Result<TransactionReceipt, SessionError> {
		let tx = Transaction {
			to: network.contract,
			value: U256::ZERO,
			data,
		};
		let hash = self.wallet.submit(network.chain_id, tx).await?;
		let receipt = self
			.wallet
			.wait_for_confirmation(network.chain_id, hash)
			.await?;
		if !receipt.success {
			warn!(chain = %network.chain_id, "transaction reverted on chain");
		}
		Ok(receipt)
	}

	/// `register(username)` on the active chain; re-derives status
	/// afterward.
	pub async fn register(&self, username: &str) -> Result<TransactionReceipt, SessionError> {
		let network = self.active_network().await?;
		let adapter = ChainAdapter::for_network(&network);
		let receipt = self.send(&network, adapter.register(username)).await?;
		self.derive_status().await;
		Ok(receipt)
	}

	/// Creates a post on the active chain with version-correct calldata.
	pub async fn create_post(
		&self,
		draft: &PostDraft,
	) -> Result<TransactionReceipt, SessionError> {
		let network = self.active_network().await?;
		self.require_author().await?;
		let adapter = ChainAdapter::for_network(&network);
		self.send(&network, adapter.create_post(draft)).await
	}

	/// Updates a post. The wallet must already be on the post's chain;
	/// cross-chain edits are refused instead of silently retargeted.
	pub async fn update_post(
		&self,
		post_chain: ChainId,
		id: u64,
		draft: &PostDraft,
	) -> Result<TransactionReceipt, SessionError> {
		let network = self.active_network().await?;
		if network.chain_id != post_chain {
			return Err(SessionError::WrongChain {
				post_chain,
				active_chain: network.chain_id,
			});
		}
		self.require_author().await?;
		let adapter = ChainAdapter::for_network(&network);
		self.send(&network, adapter.update_post(id, draft)).await
	}

	/// Deletes a post on its chain. Same advisory gate as the other post
	/// operations; the contract remains the authority on authorship.
	pub async fn delete_post(
		&self,
		post_chain: ChainId,
		id: u64,
	) -> Result<TransactionReceipt, SessionError> {
		let network = self.active_network().await?;
		if network.chain_id != post_chain {
			return Err(SessionError::WrongChain {
				post_chain,
				active_chain: network.chain_id,
			});
		}
		self.require_author().await?;
		let adapter = ChainAdapter::for_network(&network);
		self.send(&network, adapter.delete_post(id)).await
	}

	/// Toggles a user's banned flag; owner-only (advisory). Re-derives
	/// status afterward since the toggle can affect the session's own
	/// sub-attributes.
	pub async fn set_banned(
		&self,
		target: Address,
		banned: bool,
	) -> Result<TransactionReceipt, SessionError> {
		let network = self.active_network().await?;
		if !self.status().await.is_owner {
			return Err(SessionError::NotOwner);
		}
		let adapter = ChainAdapter::for_network(&network);
		let receipt = self
			.send(&network, adapter.set_banned_status(target, banned))
			.await?;
		self.derive_status().await;
		Ok(receipt)
	}
}

#[cfg(test)]
mod tests;
