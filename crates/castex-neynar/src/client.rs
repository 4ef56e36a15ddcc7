//! HTTP client for the Neynar API.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use castex_core::error::{Error, InvalidInputError, ProtocolError, TransportError};
use castex_core::{ApiKey, ApiUrl, Result};

use crate::endpoints::ApiErrorResponse;

/// Public Neynar v2 Farcaster API.
pub const DEFAULT_API_BASE: &str = "https://api.neynar.com/v2/farcaster";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Connection settings for [`NeynarClient`].
#[derive(Debug, Clone)]
pub struct NeynarConfig {
    pub base: ApiUrl,
    pub api_key: ApiKey,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl NeynarConfig {
    pub fn new(base: ApiUrl, api_key: ApiKey) -> Self {
        Self {
            base,
            api_key,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Authenticated HTTP client for the feed API.
#[derive(Debug, Clone)]
pub struct NeynarClient {
    client: reqwest::Client,
    base: ApiUrl,
    api_key: ApiKey,
}

impl NeynarClient {
    /// Create a client from its configuration.
    pub fn new(config: NeynarConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("castex/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport)?;

        Ok(Self {
            client,
            base: config.base,
            api_key: config.api_key,
        })
    }

    /// Returns the API base URL this client targets.
    pub fn base(&self) -> &ApiUrl {
        &self.base
    }

    /// Make an authenticated GET request and decode the JSON body.
    #[instrument(skip(self), fields(base = %self.base))]
    pub async fn get<Q, R>(&self, path: &str, params: &Q) -> Result<R>
    where
        Q: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.base.endpoint(path);
        debug!(path, "API query");
        trace!(?params, "query parameters");

        let response = self
            .client
            .get(&url)
            .query(params)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(transport)?;

        self.handle_response(response).await
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(self.api_key.as_str()).map_err(|_| {
            InvalidInputError::Other {
                message: "API key contains characters not allowed in a header".to_string(),
            }
        })?;
        headers.insert(API_KEY_HEADER, key);
        Ok(headers)
    }

    async fn handle_response<R: DeserializeOwned>(&self, response: reqwest::Response) -> Result<R> {
        let status = response.status();
        trace!(status = %status, "API response");

        if status.is_success() {
            response.json::<R>().await.map_err(transport)
        } else {
            Err(Error::Protocol(Self::parse_error_response(response).await))
        }
    }

    async fn parse_error_response(response: reqwest::Response) -> ProtocolError {
        let status = response.status().as_u16();

        match response.json::<ApiErrorResponse>().await {
            Ok(body) => ProtocolError::new(status, body.code, body.message),
            Err(_) => ProtocolError::new(status, None, None),
        }
    }
}

/// Map a reqwest failure onto the castex error taxonomy.
fn transport(err: reqwest::Error) -> Error {
    if err.is_decode() {
        Error::Serialization(err.to_string())
    } else if err.is_timeout() {
        Error::Transport(TransportError::Timeout)
    } else if err.is_connect() {
        Error::Transport(TransportError::Connection {
            message: err.to_string(),
        })
    } else {
        Error::Transport(TransportError::Http {
            message: err.to_string(),
        })
    }
}
