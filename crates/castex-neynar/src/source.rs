//! `FeedSource` over the user casts endpoint.

use async_trait::async_trait;
use tracing::{debug, instrument};

use castex_core::{Cursor, FeedPage, FeedSource, PageRequest, Result};

use crate::client::{NeynarClient, NeynarConfig};
use crate::endpoints::{USER_CASTS, UserCastsQuery, UserCastsResponse};

/// Pages through a user's casts on Neynar.
#[derive(Debug, Clone)]
pub struct NeynarFeed {
    client: NeynarClient,
}

impl NeynarFeed {
    pub fn new(config: NeynarConfig) -> Result<Self> {
        Ok(Self {
            client: NeynarClient::new(config)?,
        })
    }

    pub fn from_client(client: NeynarClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &NeynarClient {
        &self.client
    }
}

#[async_trait]
impl FeedSource for NeynarFeed {
    #[instrument(skip(self), fields(fid = %request.fid, has_cursor = request.cursor.is_some()))]
    async fn fetch_page(&self, request: &PageRequest) -> Result<FeedPage> {
        let query = UserCastsQuery {
            fid: request.fid.get(),
            limit: request.limit,
            include_replies: request.include_replies,
            cursor: request.cursor.as_ref().map(Cursor::as_str),
        };

        let response: UserCastsResponse = self.client.get(USER_CASTS, &query).await?;

        let next_cursor = Cursor::from_upstream(response.next.and_then(|n| n.cursor));
        debug!(
            received = response.casts.len(),
            more = next_cursor.is_some(),
            "Fetched user casts"
        );

        Ok(FeedPage {
            records: response.casts,
            next_cursor,
        })
    }
}
