//! Canonical post model shared by both ABI generations.

use crate::common::{Address, Timestamp};
use crate::network::ChainId;
use serde::{Deserialize, Serialize};

/// A normalized post record.
///
/// `(chain_id, id)` is the unique composite key; ids are never reused on a
/// chain. A deleted post survives on-chain as a ghost with `exists = false`
/// and is filtered out before display. On V5 chains `cover_image_url` is
/// always empty and `image_count` is always zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
	pub chain_id: ChainId,
	pub id: u64,
	pub title: String,
	/// Markdown body.
	pub content: String,
	pub author: Address,
	pub author_name: String,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
	pub exists: bool,
	pub cover_image_url: String,
	pub image_count: u32,
}

impl Post {
	pub fn has_cover(&self) -> bool {
		!self.cover_image_url.is_empty()
	}
}

/// A post paired with the image that represents it in gallery views.
///
/// The image is the explicit cover when set, otherwise the first markdown
/// image reference found in the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryPost {
	pub post: Post,
	pub image_url: String,
}

/// User-authored input for create/update operations.
///
/// `image_count` is only meaningful on V6 chains; when unset it is derived
/// from the markdown image references in the content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
	pub title: String,
	pub content: String,
	pub cover_image_url: Option<String>,
	pub image_count: Option<u8>,
}

impl PostDraft {
	pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			content: content.into(),
			cover_image_url: None,
			image_count: None,
		}
	}

	pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
		self.cover_image_url = Some(cover.into());
		self
	}
}
