//! Shareable deep-link encoding for direct post resolution.
//!
//! The wire format is the query string `?chain=<hex chain id>&id=<post id>`,
//! appended to whatever base URL hosts the dapp.

use crate::network::ChainId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeepLinkError {
	#[error("missing `{0}` parameter")]
	MissingParam(&'static str),
	#[error("invalid chain id: {0}")]
	InvalidChainId(String),
	#[error("invalid post id: {0}")]
	InvalidPostId(String),
}

/// A `(chain id, post id)` pair identifying one post on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
	pub chain_id: ChainId,
	pub post_id: u64,
}

impl DeepLink {
	pub fn new(chain_id: ChainId, post_id: u64) -> Self {
		Self { chain_id, post_id }
	}

	/// Renders the link against a base URL.
	pub fn to_url(&self, base: &str) -> String {
		format!("{}{}", base.trim_end_matches('?'), self)
	}

	/// Parses a deep link from a full URL, a bare query string, or the
	/// query with its leading `?` stripped.
	pub fn parse(input: &str) -> Result<Self, DeepLinkError> {
		let query = match input.split_once('?') {
			Some((_, query)) => query,
			None => input,
		};
		let query = query.split('#').next().unwrap_or_default();

		let mut chain = None;
		let mut id = None;
		for pair in query.split('&') {
			match pair.split_once('=') {
				Some(("chain", value)) => chain = Some(value),
				Some(("id", value)) => id = Some(value),
				_ => {}
			}
		}

		let chain = chain.ok_or(DeepLinkError::MissingParam("chain"))?;
		let id = id.ok_or(DeepLinkError::MissingParam("id"))?;

		let chain_id = ChainId::from_str(chain)
			.map_err(|_| DeepLinkError::InvalidChainId(chain.to_string()))?;
		let post_id = id
			.parse()
			.map_err(|_| DeepLinkError::InvalidPostId(id.to_string()))?;

		Ok(Self { chain_id, post_id })
	}
}

impl fmt::Display for DeepLink {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "?chain={}&id={}", self.chain_id, self.post_id)
	}
}
