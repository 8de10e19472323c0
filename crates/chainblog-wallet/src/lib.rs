//! Wallet capability interface.
//!
//! The session layer never talks to a provider directly; it goes through
//! [`WalletInterface`], a narrow surface modeled on what browser wallets
//! expose: account enumeration and authorization, the selected chain,
//! chain switching with an add-chain fallback, sign-and-send, and a
//! change-event stream. The trait is substitutable with a fake in tests;
//! the [`LocalWallet`] implementation backs the CLI with a private-key
//! signer.

use async_trait::async_trait;
use chainblog_types::{Address, ChainId, NetworkDescriptor, Transaction, TransactionReceipt, TxHash};
use thiserror::Error;
use tokio::sync::broadcast;

pub mod implementations;

pub use implementations::local::LocalWallet;

#[derive(Debug, Error)]
pub enum WalletError {
	#[error("no authorized accounts")]
	NoAccounts,
	#[error("request rejected by the wallet")]
	Rejected,
	#[error("chain {0} is not known to the wallet")]
	UnknownChain(ChainId),
	#[error("network error: {0}")]
	Network(String),
	#[error("signing failed: {0}")]
	Signing(String),
}

/// Account and chain change notifications, mirroring the provider events a
/// browser wallet emits.
#[derive(Debug, Clone)]
pub enum WalletEvent {
	AccountsChanged(Vec<Address>),
	ChainChanged(ChainId),
}

#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Currently authorized accounts, without prompting. An empty list means
	/// disconnected.
	async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

	/// Requests account authorization, prompting the user if needed.
	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

	/// The wallet's currently selected chain.
	async fn chain_id(&self) -> Result<ChainId, WalletError>;

	/// Switches the selected chain. Fails with [`WalletError::UnknownChain`]
	/// when the wallet has never seen the chain; callers then use
	/// [`WalletInterface::add_chain`] and retry once.
	async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError>;

	/// Teaches the wallet a chain from registry data (name + RPC URL).
	async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), WalletError>;

	/// Signs and sends a prepared transaction on the given chain.
	async fn submit(&self, chain_id: ChainId, tx: Transaction) -> Result<TxHash, WalletError>;

	/// Awaits confirmation of a submitted transaction.
	async fn wait_for_confirmation(
		&self,
		chain_id: ChainId,
		hash: TxHash,
	) -> Result<TransactionReceipt, WalletError>;

	/// Subscribes to account/chain change events.
	fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
