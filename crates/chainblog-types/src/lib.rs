//! Common types used throughout the chainblog system.
//!
//! Every other crate in the workspace builds on the canonical data model
//! defined here: network descriptors for the per-chain registry, the
//! normalized `Post` record shared by both contract ABI generations, wallet
//! session state, and the shareable deep-link encoding.

pub mod common;
pub mod deeplink;
pub mod network;
pub mod post;
pub mod session;
pub mod user;

pub use common::*;
pub use deeplink::*;
pub use network::*;
pub use post::*;
pub use session::*;
pub use user::*;
