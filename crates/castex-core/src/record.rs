//! Upstream feed record.
//!
//! [`FeedRecord`] keeps the upstream JSON object exactly as received so the
//! JSON artifact carries every field the API returned. Typed accessors read
//! the handful of fields the CSV projection needs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, InvalidInputError};

/// One cast (post, reply or reaction event) as returned by the feed API.
///
/// This type guarantees that:
/// - The value is a JSON object
/// - The object contains a non-empty string `hash`
///
/// Field order is preserved from the upstream response.
///
/// # Example
///
/// ```
/// use castex_core::FeedRecord;
/// use serde_json::json;
///
/// let record = FeedRecord::new(json!({
///     "hash": "0xabc",
///     "author": {"fid": 3, "username": "dwr"},
///     "text": "gm"
/// })).unwrap();
///
/// assert_eq!(record.hash(), "0xabc");
/// assert_eq!(record.author_username(), Some("dwr"));
/// assert_eq!(record.like_count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRecord(Map<String, Value>);

impl FeedRecord {
    /// Create a record from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an object or has no usable `hash`.
    pub fn new(value: Value) -> Result<Self, Error> {
        let Value::Object(map) = value else {
            return Err(InvalidInputError::Record {
                reason: "record must be a JSON object".to_string(),
            }
            .into());
        };

        match map.get("hash") {
            Some(Value::String(hash)) if !hash.is_empty() => Ok(Self(map)),
            Some(Value::String(_)) => Err(InvalidInputError::Record {
                reason: "hash must not be empty".to_string(),
            }
            .into()),
            Some(_) => Err(InvalidInputError::Record {
                reason: "hash must be a string".to_string(),
            }
            .into()),
            None => Err(InvalidInputError::Record {
                reason: "record must contain a hash field".to_string(),
            }
            .into()),
        }
    }

    /// The content hash; unique within an export.
    pub fn hash(&self) -> &str {
        self.str_field("hash").unwrap_or_default()
    }

    pub fn thread_hash(&self) -> Option<&str> {
        self.str_field("thread_hash")
    }

    pub fn parent_hash(&self) -> Option<&str> {
        self.str_field("parent_hash")
    }

    /// Parent URL; channel casts carry the channel URL here.
    pub fn parent_url(&self) -> Option<&str> {
        self.str_field("parent_url")
    }

    pub fn author_fid(&self) -> Option<u64> {
        self.pointer("/author/fid").and_then(Value::as_u64)
    }

    pub fn author_username(&self) -> Option<&str> {
        self.pointer("/author/username").and_then(Value::as_str)
    }

    pub fn author_display_name(&self) -> Option<&str> {
        self.pointer("/author/display_name").and_then(Value::as_str)
    }

    /// Cast body; absent for some reaction events.
    pub fn text(&self) -> Option<&str> {
        self.str_field("text")
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.str_field("timestamp")
    }

    pub fn like_count(&self) -> u64 {
        self.reaction_count("likes")
    }

    pub fn recast_count(&self) -> u64 {
        self.reaction_count("recasts")
    }

    pub fn reply_count(&self) -> u64 {
        self.pointer("/replies/count")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Embedded URLs in upstream order. Embeds without a URL (quoted casts) are skipped.
    pub fn embeds(&self) -> Vec<&str> {
        self.0
            .get("embeds")
            .and_then(Value::as_array)
            .map(|embeds| embeds.iter().filter_map(embed_url).collect())
            .unwrap_or_default()
    }

    /// Get a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a nested value by JSON pointer.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let (first, rest) = pointer.trim_start_matches('/').split_once('/').unwrap_or((
            pointer.trim_start_matches('/'),
            "",
        ));
        let head = self.0.get(first)?;
        if rest.is_empty() {
            Some(head)
        } else {
            head.pointer(&format!("/{}", rest))
        }
    }

    /// Get a reference to the underlying object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume and return the underlying object.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    // Accepts `likes_count: n`, `likes: n` or `likes: [..]`.
    fn reaction_count(&self, kind: &str) -> u64 {
        let Some(reactions) = self.0.get("reactions") else {
            return 0;
        };
        count_value(reactions.get(format!("{}_count", kind)))
            .or_else(|| count_value(reactions.get(kind)))
            .unwrap_or(0)
    }
}

/// A count field that is either a number or a list of the counted items.
pub(crate) fn count_value(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::Array(items) => Some(items.len() as u64),
        _ => None,
    }
}

/// URL of one embed: a bare string or an object with a `url` field.
pub(crate) fn embed_url(embed: &Value) -> Option<&str> {
    match embed {
        Value::String(url) => Some(url.as_str()),
        Value::Object(obj) => obj.get("url").and_then(Value::as_str),
        _ => None,
    }
}

impl Serialize for FeedRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FeedRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        FeedRecord::new(value).map_err(serde::de::Error::custom)
    }
}
