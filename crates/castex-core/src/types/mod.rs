//! Core castex types.
//!
//! These types enforce their invariants at construction time, so an export
//! never reaches the network with a malformed subject, format or key.

mod api_key;
mod api_url;
mod cursor;
mod fid;
mod format;
mod object_key;

pub use api_key::ApiKey;
pub use api_url::ApiUrl;
pub use cursor::Cursor;
pub use fid::Fid;
pub use format::ExportFormat;
pub use object_key::ObjectKey;
