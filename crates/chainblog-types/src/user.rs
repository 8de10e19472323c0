//! On-chain user record.

use crate::common::Address;
use serde::{Deserialize, Serialize};

/// Shape of the contract's `users(address)` mapping entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
	pub address: Address,
	pub username: String,
	pub is_banned: bool,
	pub is_registered: bool,
}
