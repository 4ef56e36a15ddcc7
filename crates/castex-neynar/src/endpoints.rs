//! Feed API endpoint definitions and request/response types.

use serde::{Deserialize, Serialize};

use castex_core::FeedRecord;

/// GET user casts, newest first.
pub const USER_CASTS: &str = "feed/user/casts";

/// Query string for [`USER_CASTS`].
#[derive(Debug, Serialize)]
pub struct UserCastsQuery<'a> {
    pub fid: u64,
    pub limit: u32,
    pub include_replies: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<&'a str>,
}

/// Response from [`USER_CASTS`].
#[derive(Debug, Deserialize)]
pub struct UserCastsResponse {
    #[serde(default)]
    pub casts: Vec<FeedRecord>,
    #[serde(default)]
    pub next: Option<NextPage>,
}

/// Continuation block of a paged response.
#[derive(Debug, Deserialize)]
pub struct NextPage {
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
