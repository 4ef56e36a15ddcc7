//! JSON export envelope.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::Result;
use crate::fetch::FetchOutcome;
use crate::record::FeedRecord;
use crate::types::Fid;

/// Envelope metadata. Field order is the serialized key order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestMetadata {
    pub fid: Fid,
    #[serde(serialize_with = "serialize_millis")]
    pub export_date: DateTime<Utc>,
    pub count: usize,
    pub include_replies: bool,
    /// Pagination stopped before the feed was exhausted.
    pub truncated: bool,
}

/// One completed export: metadata first, then every record in upstream order.
#[derive(Debug, Clone, Serialize)]
pub struct ExportManifest {
    pub metadata: ManifestMetadata,
    pub casts: Vec<FeedRecord>,
}

impl ExportManifest {
    /// Wrap a fetch outcome.
    pub fn new(
        fid: Fid,
        export_date: DateTime<Utc>,
        include_replies: bool,
        outcome: FetchOutcome,
    ) -> Self {
        let truncated = !outcome.is_complete();
        let casts = outcome.records;
        Self {
            metadata: ManifestMetadata {
                fid,
                export_date,
                count: casts.len(),
                include_replies,
                truncated,
            },
            casts,
        }
    }

    /// Pretty-printed UTF-8 JSON. Consumes the manifest: it is serialized once.
    pub fn into_json_bytes(self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self)?)
    }
}

fn serialize_millis<S>(at: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
