//! Network identity and registry descriptor types.

use crate::common::Address;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Chain identifier.
///
/// Parses from either the `0x`-prefixed hex form used by wallets and deep
/// links or a plain decimal string; displays as hex to match the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainId(pub u64);

impl ChainId {
	pub const GNOSIS: Self = Self(0x64);
	pub const OPBNB: Self = Self(0xcc);
	pub const SEPOLIA: Self = Self(0xaa36a7);

	pub fn as_u64(&self) -> u64 {
		self.0
	}
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{:x}", self.0)
	}
}

impl FromStr for ChainId {
	type Err = ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
			Ok(ChainId(u64::from_str_radix(hex, 16)?))
		} else {
			Ok(ChainId(s.parse()?))
		}
	}
}

impl From<u64> for ChainId {
	fn from(value: u64) -> Self {
		ChainId(value)
	}
}

impl Serialize for ChainId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for ChainId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct ChainIdVisitor;

		impl de::Visitor<'_> for ChainIdVisitor {
			type Value = ChainId;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("a chain id as a hex/decimal string or an integer")
			}

			fn visit_str<E: de::Error>(self, value: &str) -> Result<ChainId, E> {
				value.parse().map_err(de::Error::custom)
			}

			fn visit_u64<E: de::Error>(self, value: u64) -> Result<ChainId, E> {
				Ok(ChainId(value))
			}

			fn visit_i64<E: de::Error>(self, value: i64) -> Result<ChainId, E> {
				u64::try_from(value).map(ChainId).map_err(de::Error::custom)
			}
		}

		deserializer.deserialize_any(ChainIdVisitor)
	}
}

/// Contract ABI generation deployed on a chain.
///
/// V5 has no image fields; V6 adds `coverImageUrl` and `imageCount` to the
/// post tuple and to the create/update signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbiVersion {
	#[default]
	V5,
	V6,
}

impl AbiVersion {
	pub fn has_image_fields(&self) -> bool {
		matches!(self, AbiVersion::V6)
	}
}

/// Mainnet/testnet classification, used for display and registry stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
	Mainnet,
	#[default]
	Testnet,
}

/// Immutable description of one chain's contract deployment.
///
/// Descriptors never change for the lifetime of the process; the
/// user-selected active subset is tracked separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
	pub chain_id: ChainId,
	pub name: String,
	pub contract: Address,
	pub rpc_url: String,
	pub abi_version: AbiVersion,
	pub kind: NetworkKind,
	pub color: String,
	pub default_active: bool,
}
