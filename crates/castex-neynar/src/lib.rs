//! castex-neynar - Neynar-backed feed source.

mod client;
mod endpoints;
mod source;

pub use client::{DEFAULT_API_BASE, NeynarClient, NeynarConfig};
pub use source::NeynarFeed;
