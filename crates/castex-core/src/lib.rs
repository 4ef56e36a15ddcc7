//! castex-core - Core types, traits and the export pipeline.
//!
//! The pipeline is split along two seams: a [`FeedSource`] that yields one
//! page of upstream records at a time, and an [`ObjectStore`] that accepts
//! the finished [`Artifact`]. Network implementations live in sibling crates.

pub mod csv;
pub mod error;
pub mod export;
pub mod fetch;
pub mod manifest;
pub mod record;
pub mod store;
pub mod types;

pub use csv::{CastRow, CsvDialect, flatten};
pub use error::Error;
pub use export::{ExportOptions, ExportReceipt, Exporter, TruncationPolicy};
pub use fetch::{FeedFetcher, FeedPage, FeedSource, FetchOptions, FetchOutcome, PageRequest, Truncation};
pub use manifest::ExportManifest;
pub use record::FeedRecord;
pub use store::{Artifact, ObjectStore};
pub use types::{ApiKey, ApiUrl, Cursor, ExportFormat, Fid, ObjectKey};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
