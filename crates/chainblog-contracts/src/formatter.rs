//! Normalization of raw contract tuples into the canonical post model.

use alloy::primitives::{Address, U256};
use chainblog_types::{AbiVersion, ChainId, Post};
use regex::Regex;
use std::sync::OnceLock;

use crate::abi::{ChainBlogV5, ChainBlogV6};

/// Version-agnostic raw post tuple as decoded from a contract read.
///
/// The optional fields only exist on V6 chains. `chain_label` is carried by
/// the on-chain tuple but dropped during normalization.
#[derive(Debug, Clone, Default)]
pub struct RawPost {
	pub id: U256,
	pub title: String,
	pub content: String,
	pub author: Address,
	pub author_name: String,
	pub created_at: U256,
	pub updated_at: U256,
	pub chain_label: String,
	pub exists: bool,
	pub cover_image_url: Option<String>,
	pub image_count: Option<u8>,
}

impl From<ChainBlogV5::PostRow> for RawPost {
	fn from(row: ChainBlogV5::PostRow) -> Self {
		Self {
			id: row.id,
			title: row.title,
			content: row.content,
			author: row.author,
			author_name: row.authorName,
			created_at: row.createdAt,
			updated_at: row.updatedAt,
			chain_label: row.chainLabel,
			exists: row.exists,
			cover_image_url: None,
			image_count: None,
		}
	}
}

impl From<ChainBlogV6::PostRow> for RawPost {
	fn from(row: ChainBlogV6::PostRow) -> Self {
		Self {
			id: row.id,
			title: row.title,
			content: row.content,
			author: row.author,
			author_name: row.authorName,
			created_at: row.createdAt,
			updated_at: row.updatedAt,
			chain_label: row.chainLabel,
			exists: row.exists,
			cover_image_url: Some(row.coverImageUrl),
			image_count: Some(row.imageCount),
		}
	}
}

impl From<ChainBlogV5::postsReturn> for RawPost {
	fn from(row: ChainBlogV5::postsReturn) -> Self {
		Self {
			id: row.id,
			title: row.title,
			content: row.content,
			author: row.author,
			author_name: row.authorName,
			created_at: row.createdAt,
			updated_at: row.updatedAt,
			chain_label: row.chainLabel,
			exists: row.exists,
			cover_image_url: None,
			image_count: None,
		}
	}
}

impl From<ChainBlogV6::postsReturn> for RawPost {
	fn from(row: ChainBlogV6::postsReturn) -> Self {
		Self {
			id: row.id,
			title: row.title,
			content: row.content,
			author: row.author,
			author_name: row.authorName,
			created_at: row.createdAt,
			updated_at: row.updatedAt,
			chain_label: row.chainLabel,
			exists: row.exists,
			cover_image_url: Some(row.coverImageUrl),
			image_count: Some(row.imageCount),
		}
	}
}

/// Converts a raw tuple into a canonical [`Post`].
///
/// V6 chains populate the cover/image fields; V5 chains force them to
/// empty/zero regardless of raw content. Numeric coercion is defensive:
/// values that do not fit the canonical width collapse to 0 instead of
/// raising.
pub fn format_post(raw: RawPost, chain_id: ChainId, version: AbiVersion) -> Post {
	let (cover_image_url, image_count) = match version {
		AbiVersion::V5 => (String::new(), 0),
		AbiVersion::V6 => (
			raw.cover_image_url.unwrap_or_default(),
			u32::from(raw.image_count.unwrap_or(0)),
		),
	};

	Post {
		chain_id,
		id: clamp_u64(raw.id),
		title: raw.title,
		content: raw.content,
		author: raw.author,
		author_name: raw.author_name,
		created_at: clamp_u64(raw.created_at),
		updated_at: clamp_u64(raw.updated_at),
		exists: raw.exists,
		cover_image_url,
		image_count,
	}
}

fn clamp_u64(value: U256) -> u64 {
	u64::try_from(value).unwrap_or(0)
}

fn image_regex() -> &'static Regex {
	static MD_IMAGE: OnceLock<Regex> = OnceLock::new();
	MD_IMAGE.get_or_init(|| Regex::new(r"!\[[^\]]*\]\(([^)]*)\)").unwrap())
}

/// Returns the URL of the first markdown image reference (`![alt](url)`)
/// in the content, if any.
///
/// Best-effort heuristic used as the gallery fallback when a post has no
/// explicit cover; kept here so it can evolve independently of aggregation.
pub fn first_markdown_image(content: &str) -> Option<&str> {
	image_regex()
		.captures(content)
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str())
		.filter(|url| !url.is_empty())
}

/// Counts markdown image references, saturating at the `uint8` range of the
/// V6 `imageCount` field.
pub fn count_markdown_images(content: &str) -> u8 {
	content.matches("![").count().min(u8::MAX as usize) as u8
}

#[cfg(test)]
mod tests {
	use super::*;

	fn raw(created_at: u64) -> RawPost {
		RawPost {
			id: U256::from(1),
			title: "t".into(),
			content: "c".into(),
			author: Address::ZERO,
			author_name: "a".into(),
			created_at: U256::from(created_at),
			updated_at: U256::from(created_at),
			exists: true,
			..Default::default()
		}
	}

	#[test]
	fn test_v5_posts_never_carry_image_fields() {
		let mut tuple = raw(10);
		// Even a malformed V5 tuple carrying image data must normalize to
		// empty/zero.
		tuple.cover_image_url = Some("https://img/sneaky.png".into());
		tuple.image_count = Some(7);

		let post = format_post(tuple, ChainId(100), AbiVersion::V5);
		assert_eq!(post.cover_image_url, "");
		assert_eq!(post.image_count, 0);
	}

	#[test]
	fn test_v6_posts_keep_image_fields() {
		let mut tuple = raw(10);
		tuple.cover_image_url = Some("https://img/cover.png".into());
		tuple.image_count = Some(3);

		let post = format_post(tuple, ChainId(0xa5bd), AbiVersion::V6);
		assert_eq!(post.cover_image_url, "https://img/cover.png");
		assert_eq!(post.image_count, 3);
	}

	#[test]
	fn test_out_of_range_numerics_collapse_to_zero() {
		let mut tuple = raw(10);
		tuple.id = U256::MAX;
		tuple.created_at = U256::from(u64::MAX) + U256::from(1);

		let post = format_post(tuple, ChainId(100), AbiVersion::V5);
		assert_eq!(post.id, 0);
		assert_eq!(post.created_at, 0);
		assert_eq!(post.updated_at, 10);
	}

	#[test]
	fn test_first_markdown_image() {
		assert_eq!(
			first_markdown_image("intro ![alt](https://img/1.png) more"),
			Some("https://img/1.png")
		);
		assert_eq!(
			first_markdown_image("![](https://img/bare.png) ![x](https://img/2.png)"),
			Some("https://img/bare.png")
		);
		assert_eq!(first_markdown_image("no images here"), None);
		// An empty target is not a usable image reference.
		assert_eq!(first_markdown_image("![alt]()"), None);
	}

	#[test]
	fn test_count_markdown_images() {
		assert_eq!(count_markdown_images("plain text"), 0);
		assert_eq!(count_markdown_images("![a](u) and ![b](v)"), 2);
	}
}
