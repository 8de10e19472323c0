//! Solidity bindings for both contract generations and the version adapter.

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use chainblog_types::{AbiVersion, NetworkDescriptor, PostDraft};

use crate::formatter::count_markdown_images;

// Solidity definitions for the two deployed contract generations. The V5
// shape predates image support; V6 extends the post tuple and the
// create/update signatures with cover/image fields.
sol! {
	#[sol(rpc)]
	contract ChainBlogV5 {
		struct PostRow {
			uint256 id;
			string title;
			string content;
			address author;
			string authorName;
			uint256 createdAt;
			uint256 updatedAt;
			string chainLabel;
			bool exists;
		}

		function register(string _username) external;
		function createPost(string _title, string _content) external;
		function updatePost(uint256 _id, string _newTitle, string _newContent) external;
		function deletePost(uint256 _id) external;
		function setBannedStatus(address _user, bool _status) external;

		function users(address _user) external view returns (string username, bool isBanned, bool isRegistered, address userAddress);
		function allRegisteredUsers(uint256 _index) external view returns (address);
		function getUserCount() external view returns (uint256);
		function getPostIdsByAddress(address _user) external view returns (uint256[] memory);
		function owner() external view returns (address);
		function getPostCount() external view returns (uint256);
		function posts(uint256 _id) external view returns (uint256 id, string title, string content, address author, string authorName, uint256 createdAt, uint256 updatedAt, string chainLabel, bool exists);
		function getPaginatedPosts(uint256 _page, uint256 _pageSize) external view returns (PostRow[] memory);
	}

	#[sol(rpc)]
	contract ChainBlogV6 {
		struct PostRow {
			uint256 id;
			string title;
			string content;
			address author;
			string authorName;
			uint256 createdAt;
			uint256 updatedAt;
			string chainLabel;
			bool exists;
			string coverImageUrl;
			uint8 imageCount;
		}

		function register(string _username) external;
		function createPost(string _title, string _content, string _coverImageUrl, uint8 _imageCount) external;
		function updatePost(uint256 _id, string _newTitle, string _newContent, string _newCoverImageUrl, uint8 _newImageCount) external;
		function deletePost(uint256 _id) external;
		function setBannedStatus(address _user, bool _status) external;

		function users(address _user) external view returns (string username, bool isBanned, bool isRegistered, address userAddress);
		function allRegisteredUsers(uint256 _index) external view returns (address);
		function getUserCount() external view returns (uint256);
		function getPostIdsByAddress(address _user) external view returns (uint256[] memory);
		function owner() external view returns (address);
		function getPostCount() external view returns (uint256);
		function posts(uint256 _id) external view returns (uint256 id, string title, string content, address author, string authorName, uint256 createdAt, uint256 updatedAt, string chainLabel, bool exists, string coverImageUrl, uint8 imageCount);
		function getPaginatedPosts(uint256 _page, uint256 _pageSize) external view returns (PostRow[] memory);
	}
}

/// Resolves a descriptor's ABI-version flag once into version-correct
/// calldata encoders.
///
/// The adapter is a pure function of the version tag; it performs no I/O and
/// only parameterizes calls issued elsewhere. Operations shared by both
/// generations encode identically and use the V5 call types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainAdapter {
	version: AbiVersion,
}

impl ChainAdapter {
	pub fn new(version: AbiVersion) -> Self {
		Self { version }
	}

	pub fn for_network(network: &NetworkDescriptor) -> Self {
		Self::new(network.abi_version)
	}

	pub fn version(&self) -> AbiVersion {
		self.version
	}

	/// `register(username)`, identical on both generations.
	pub fn register(&self, username: &str) -> Vec<u8> {
		ChainBlogV5::registerCall {
			_username: username.to_string(),
		}
		.abi_encode()
	}

	/// `createPost` with version-correct arity. On V6, a missing explicit
	/// image count falls back to the number of markdown image references in
	/// the content.
	pub fn create_post(&self, draft: &PostDraft) -> Vec<u8> {
		match self.version {
			AbiVersion::V5 => ChainBlogV5::createPostCall {
				_title: draft.title.clone(),
				_content: draft.content.clone(),
			}
			.abi_encode(),
			AbiVersion::V6 => ChainBlogV6::createPostCall {
				_title: draft.title.clone(),
				_content: draft.content.clone(),
				_coverImageUrl: draft.cover_image_url.clone().unwrap_or_default(),
				_imageCount: draft
					.image_count
					.unwrap_or_else(|| count_markdown_images(&draft.content)),
			}
			.abi_encode(),
		}
	}

	/// `updatePost` with version-correct arity.
	pub fn update_post(&self, id: u64, draft: &PostDraft) -> Vec<u8> {
		match self.version {
			AbiVersion::V5 => ChainBlogV5::updatePostCall {
				_id: U256::from(id),
				_newTitle: draft.title.clone(),
				_newContent: draft.content.clone(),
			}
			.abi_encode(),
			AbiVersion::V6 => ChainBlogV6::updatePostCall {
				_id: U256::from(id),
				_newTitle: draft.title.clone(),
				_newContent: draft.content.clone(),
				_newCoverImageUrl: draft.cover_image_url.clone().unwrap_or_default(),
				_newImageCount: draft
					.image_count
					.unwrap_or_else(|| count_markdown_images(&draft.content)),
			}
			.abi_encode(),
		}
	}

	/// `deletePost(id)`, identical on both generations.
	pub fn delete_post(&self, id: u64) -> Vec<u8> {
		ChainBlogV5::deletePostCall { _id: U256::from(id) }.abi_encode()
	}

	/// `setBannedStatus(user, status)`, identical on both generations.
	pub fn set_banned_status(&self, user: Address, banned: bool) -> Vec<u8> {
		ChainBlogV5::setBannedStatusCall {
			_user: user,
			_status: banned,
		}
		.abi_encode()
	}
}
