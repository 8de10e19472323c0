//! Shared primitives and transaction types.

use serde::{Deserialize, Serialize};

// Re-export commonly used ethereum types
pub use alloy::primitives::{Address, B256, U256};

/// Transaction hash
pub type TxHash = B256;

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// A prepared contract call, ready for a wallet to sign and send.
///
/// Gas parameters are left to the submitting provider's fillers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	pub to: Address,
	pub value: U256,
	pub data: Vec<u8>,
}

/// Receipt for a confirmed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
	pub hash: TxHash,
	pub block_number: u64,
	pub success: bool,
}
