//! Storage key type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ExportFormat, Fid};
use crate::error::{Error, InvalidInputError};

/// Prefix shared by every export artifact name.
const KEY_PREFIX: &str = "farcaster-casts";

/// A validated object key within a bucket.
///
/// Keys are relative, slash-separated and never contain `..` segments or
/// backslashes, so a filesystem store can map them under its root safely.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a key from a string, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Deterministic artifact name for an export of `fid` started at `at`.
    ///
    /// ```
    /// use castex_core::{ExportFormat, Fid, ObjectKey};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
    /// let key = ObjectKey::for_export(Fid::new(3).unwrap(), at, ExportFormat::Csv);
    /// assert_eq!(key.as_str(), "farcaster-casts-3-2024-05-01T12-30-00-000Z.csv");
    /// ```
    pub fn for_export(fid: Fid, at: DateTime<Utc>, format: ExportFormat) -> Self {
        let stamp = at
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        Self(format!(
            "{}-{}-{}.{}",
            KEY_PREFIX,
            fid,
            stamp,
            format.extension()
        ))
    }

    /// Insert `-{suffix}` in front of the extension.
    pub fn with_suffix(&self, suffix: &str) -> Result<Self, Error> {
        let (file_start, file) = match self.0.rfind('/') {
            Some(idx) => (idx + 1, &self.0[idx + 1..]),
            None => (0, self.0.as_str()),
        };
        let key = match file.rfind('.') {
            Some(dot) if dot > 0 => {
                let at = file_start + dot;
                format!("{}-{}{}", &self.0[..at], suffix, &self.0[at..])
            }
            _ => format!("{}-{}", self.0, suffix),
        };
        Self::new(key)
    }

    /// Returns the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the slash-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    fn validate(s: &str) -> Result<(), Error> {
        let reason = if s.is_empty() {
            Some("must not be empty")
        } else if s.starts_with('/') {
            Some("must be relative")
        } else if s.contains('\\') {
            Some("must not contain backslashes")
        } else if s.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            Some("must not contain empty, '.' or '..' segments")
        } else if s.len() > 1024 {
            Some("must be at most 1024 bytes")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(InvalidInputError::ObjectKey {
                value: s.to_string(),
                reason: reason.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectKey> for String {
    fn from(key: ObjectKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
