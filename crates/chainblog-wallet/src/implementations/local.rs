//! Private-key wallet for headless use.
//!
//! Implements the wallet capability over an alloy local signer: a single
//! always-authorized account, a registry-seeded chain list, and wallet-filled
//! providers for submission. Used by the CLI; tests use a mock instead.

use crate::{WalletError, WalletEvent, WalletInterface};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use chainblog_registry::NetworkRegistry;
use chainblog_types::{Address, ChainId, NetworkDescriptor, Transaction, TransactionReceipt, TxHash};
use dashmap::DashMap;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// Truncates a transaction hash for log output.
fn truncate_hash(hash: &TxHash) -> String {
	let hash_str = hex::encode(hash.0);
	if hash_str.len() <= 8 {
		hash_str
	} else {
		format!("{}..", &hash_str[..8])
	}
}

#[derive(Debug)]
pub struct LocalWallet {
	address: Address,
	wallet: EthereumWallet,
	confirmations: u64,
	/// chain id -> RPC URL; grown by `add_chain`.
	known_chains: DashMap<ChainId, String>,
	providers: DashMap<ChainId, DynProvider>,
	active_chain: RwLock<ChainId>,
	events: broadcast::Sender<WalletEvent>,
}

impl LocalWallet {
	/// Creates a wallet from a hex private key, seeded with every chain the
	/// registry knows. The initial chain must be one of them.
	pub fn new(
		private_key: &str,
		initial_chain: ChainId,
		registry: &NetworkRegistry,
		confirmations: u64,
	) -> Result<Self, WalletError> {
		let signer: PrivateKeySigner = private_key
			.trim()
			.parse()
			.map_err(|e| WalletError::Signing(format!("invalid private key: {}", e)))?;
		let address = signer.address();

		let known_chains = DashMap::new();
		for network in registry.iter() {
			known_chains.insert(network.chain_id, network.rpc_url.clone());
		}
		if !known_chains.contains_key(&initial_chain) {
			return Err(WalletError::UnknownChain(initial_chain));
		}

		let (events, _) = broadcast::channel(16);

		Ok(Self {
			address,
			wallet: EthereumWallet::from(signer),
			confirmations,
			known_chains,
			providers: DashMap::new(),
			active_chain: RwLock::new(initial_chain),
			events,
		})
	}

	pub fn address(&self) -> Address {
		self.address
	}

	fn provider(&self, chain_id: ChainId) -> Result<DynProvider, WalletError> {
		if let Some(existing) = self.providers.get(&chain_id) {
			return Ok(existing.clone());
		}

		let rpc_url = self
			.known_chains
			.get(&chain_id)
			.map(|entry| entry.clone())
			.ok_or(WalletError::UnknownChain(chain_id))?;
		let url = rpc_url
			.parse()
			.map_err(|e| WalletError::Network(format!("invalid RPC URL `{}`: {}", rpc_url, e)))?;

		let provider = ProviderBuilder::new()
			.wallet(self.wallet.clone())
			.connect_http(url)
			.erased();

		self.providers.insert(chain_id, provider.clone());
		Ok(provider)
	}
}

#[async_trait]
impl WalletInterface for LocalWallet {
	async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
		Ok(vec![self.address])
	}

	async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
		// A key-backed wallet has nothing to prompt for.
		Ok(vec![self.address])
	}

	async fn chain_id(&self) -> Result<ChainId, WalletError> {
		Ok(*self.active_chain.read().await)
	}

	async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError> {
		if !self.known_chains.contains_key(&chain_id) {
			return Err(WalletError::UnknownChain(chain_id));
		}

		*self.active_chain.write().await = chain_id;
		let _ = self.events.send(WalletEvent::ChainChanged(chain_id));
		debug!(chain = %chain_id, "switched active chain");
		Ok(())
	}

	async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), WalletError> {
		self.known_chains
			.insert(network.chain_id, network.rpc_url.clone());
		debug!(chain = %network.chain_id, name = %network.name, "added chain to wallet");
		Ok(())
	}

	async fn submit(&self, chain_id: ChainId, tx: Transaction) -> Result<TxHash, WalletError> {
		let provider = self.provider(chain_id)?;

		let request = TransactionRequest::default()
			.with_to(tx.to)
			.with_value(tx.value)
			.with_input(tx.data);

		let pending = provider
			.send_transaction(request)
			.await
			.map_err(|e| WalletError::Network(format!("failed to send transaction: {}", e)))?;

		let hash = *pending.tx_hash();
		info!(chain = %chain_id, tx_hash = %truncate_hash(&hash), "submitted transaction");
		Ok(hash)
	}

	async fn wait_for_confirmation(
		&self,
		chain_id: ChainId,
		hash: TxHash,
	) -> Result<TransactionReceipt, WalletError> {
		let provider = self.provider(chain_id)?;
		let confirmations = self.confirmations;

		let poll_interval = tokio::time::Duration::from_secs(5);
		// ~20 seconds per confirmation, capped at 15 minutes.
		let timeout_seconds = (confirmations * 20).max(20).min(900);
		let max_wait_time = tokio::time::Duration::from_secs(timeout_seconds);
		let start_time = tokio::time::Instant::now();

		info!(
			tx_hash = %truncate_hash(&hash),
			"waiting for {} confirmations (timeout: {}s)",
			confirmations,
			timeout_seconds
		);

		loop {
			if start_time.elapsed() > max_wait_time {
				return Err(WalletError::Network(format!(
					"timeout waiting for {} confirmations after {} seconds",
					confirmations,
					max_wait_time.as_secs()
				)));
			}

			let receipt = match provider.get_transaction_receipt(hash).await {
				Ok(Some(receipt)) => receipt,
				Ok(None) => {
					// Not yet mined.
					tokio::time::sleep(poll_interval).await;
					continue;
				}
				Err(e) => {
					return Err(WalletError::Network(format!(
						"failed to get receipt: {}",
						e
					)));
				}
			};

			let current_block = provider
				.get_block_number()
				.await
				.map_err(|e| WalletError::Network(format!("failed to get block number: {}", e)))?;

			let tx_block = receipt.block_number.unwrap_or(0);
			let current_confirmations = current_block.saturating_sub(tx_block);

			if current_confirmations >= confirmations.saturating_sub(1) {
				return Ok(TransactionReceipt {
					hash: receipt.transaction_hash,
					block_number: tx_block,
					success: receipt.status(),
				});
			}

			debug!(
				"waiting for {} more confirmations...",
				confirmations.saturating_sub(current_confirmations)
			);
			tokio::time::sleep(poll_interval).await;
		}
	}

	fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
		self.events.subscribe()
	}
}
