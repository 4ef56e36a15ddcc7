//! Export orchestration: fetch, serialize, upload.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::Result;
use crate::csv::{CsvDialect, records_to_csv};
use crate::error::{Error, UploadError};
use crate::fetch::{FeedFetcher, FeedSource, FetchOptions};
use crate::manifest::ExportManifest;
use crate::store::{Artifact, ObjectStore};
use crate::types::{ExportFormat, Fid, ObjectKey};

/// What to do when pagination stops early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationPolicy {
    /// Publish what was fetched and flag it as truncated.
    #[default]
    Allow,
    /// Abort with [`Error::Truncated`]; nothing is uploaded.
    Fail,
}

/// Export tuning.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub fetch: FetchOptions,
    pub truncation: TruncationPolicy,
    pub csv_dialect: CsvDialect,
}

/// Result of a published export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    /// Public URL of the artifact, as reported by the store.
    pub url: String,
    pub key: ObjectKey,
    pub format: ExportFormat,
    /// Records in the artifact.
    pub count: usize,
    /// The artifact holds fewer records than upstream has.
    pub truncated: bool,
}

/// Runs exports against a feed source and an object store.
///
/// Exports share no mutable state, so one `Exporter` may serve concurrent
/// requests for the same subject; each gets its own timestamped key.
#[derive(Debug, Clone)]
pub struct Exporter<F, S> {
    fetcher: FeedFetcher<F>,
    store: S,
    truncation: TruncationPolicy,
    csv_dialect: CsvDialect,
}

impl<F: FeedSource, S: ObjectStore> Exporter<F, S> {
    pub fn new(source: F, store: S) -> Self {
        Self::with_options(source, store, ExportOptions::default())
    }

    pub fn with_options(source: F, store: S, options: ExportOptions) -> Self {
        Self {
            fetcher: FeedFetcher::with_options(source, options.fetch),
            store,
            truncation: options.truncation,
            csv_dialect: options.csv_dialect,
        }
    }

    pub fn fetcher(&self) -> &FeedFetcher<F> {
        &self.fetcher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate caller input, then export. Malformed input never reaches the network.
    pub async fn export_raw(
        &self,
        fid: &str,
        format: &str,
        include_replies: bool,
    ) -> Result<ExportReceipt> {
        let fid: Fid = fid.parse()?;
        let format: ExportFormat = format.parse()?;
        self.export(fid, format, include_replies).await
    }

    /// Export everything `fid` has posted, timestamped now.
    pub async fn export(
        &self,
        fid: Fid,
        format: ExportFormat,
        include_replies: bool,
    ) -> Result<ExportReceipt> {
        self.export_at(fid, format, include_replies, Utc::now()).await
    }

    /// Export with an explicit export instant.
    #[instrument(skip(self, at), fields(%fid, %format))]
    pub async fn export_at(
        &self,
        fid: Fid,
        format: ExportFormat,
        include_replies: bool,
        at: DateTime<Utc>,
    ) -> Result<ExportReceipt> {
        let outcome = self.fetcher.fetch_all(fid, include_replies).await;

        if let Some(truncation) = &outcome.truncation {
            match self.truncation {
                TruncationPolicy::Fail => {
                    return Err(Error::Truncated {
                        fetched: outcome.records.len(),
                        reason: truncation.reason.clone(),
                    });
                }
                TruncationPolicy::Allow => warn!(
                    fetched = outcome.records.len(),
                    page = truncation.page,
                    reason = %truncation.reason,
                    "Publishing truncated export"
                ),
            }
        }

        let count = outcome.records.len();
        let truncated = !outcome.is_complete();

        let body = match format {
            ExportFormat::Json => {
                ExportManifest::new(fid, at, include_replies, outcome).into_json_bytes()?
            }
            ExportFormat::Csv => records_to_csv(&outcome.records, self.csv_dialect)?.into_bytes(),
        };

        let artifact = Artifact::new(
            ObjectKey::for_export(fid, at, format),
            format.content_type(),
            body,
        );
        let key = self.upload(artifact).await?;
        let url = self.store.public_url(&key);

        info!(%key, count, truncated, "Export published");

        Ok(ExportReceipt {
            url,
            key,
            format,
            count,
            truncated,
        })
    }

    /// Put the artifact; on a key collision retry once under a suffixed key.
    async fn upload(&self, mut artifact: Artifact) -> Result<ObjectKey> {
        match self.store.put(&artifact).await {
            Ok(()) => Ok(artifact.key),
            Err(Error::Upload(UploadError::AlreadyExists { key })) => {
                let nonce = Uuid::new_v4().simple().to_string();
                artifact.key = artifact.key.with_suffix(&nonce[..8])?;
                warn!(%key, retry_key = %artifact.key, "Key already taken, retrying");
                self.store.put(&artifact).await?;
                Ok(artifact.key)
            }
            Err(e) => Err(e),
        }
    }
}
