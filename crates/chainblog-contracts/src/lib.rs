//! Contract ABI surface for the chainblog system.
//!
//! Two incompatible contract generations are deployed across the supported
//! chains: V5 (no image fields) and V6 (adds `coverImageUrl`/`imageCount` to
//! reads and writes). This crate owns both Solidity bindings, the pure
//! [`ChainAdapter`] that resolves a network descriptor's version flag into
//! version-correct calldata once, and the [`formatter`] that normalizes raw
//! contract tuples into the canonical [`chainblog_types::Post`] model.
//!
//! Nothing in this crate performs I/O.

pub mod abi;
pub mod formatter;

pub use abi::{ChainAdapter, ChainBlogV5, ChainBlogV6};
pub use formatter::{count_markdown_images, first_markdown_image, format_post, RawPost};
