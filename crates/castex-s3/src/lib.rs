//! castex-s3 - S3-backed object store.
//!
//! Uploads are plain signed `PUT Object` requests; no AWS SDK is involved.

mod config;
mod sign;
mod store;

pub use config::{AwsCredentials, S3Config};
pub use store::S3Store;
