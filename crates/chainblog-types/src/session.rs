//! Wallet session state.

use crate::common::Address;
use crate::network::ChainId;
use serde::{Deserialize, Serialize};

/// Connection state reported by the wallet.
///
/// `chain_id` is whatever chain the wallet currently has selected; it may or
/// may not be present in the network registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
	pub address: Option<Address>,
	pub chain_id: Option<ChainId>,
	pub connected: bool,
}

impl WalletSession {
	pub fn disconnected() -> Self {
		Self::default()
	}
}

/// Sub-attributes derived from the active chain's contract for the connected
/// account.
///
/// These are re-derived from scratch after every account or chain transition
/// and are never carried across chains. The default value doubles as the
/// degraded outcome when the derivation read fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatus {
	pub is_registered: bool,
	pub username: String,
	pub is_banned: bool,
	pub is_owner: bool,
}

impl UserStatus {
	/// Advisory check for post-authoring operations.
	pub fn can_author(&self) -> bool {
		self.is_registered && !self.is_banned
	}
}
