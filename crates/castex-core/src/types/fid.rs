//! Subject identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A Farcaster id: the account whose casts are exported.
///
/// Always a positive integer. Parsing from text is strict: no sign, no
/// whitespace, no leading `0x`.
///
/// ```
/// use castex_core::Fid;
///
/// let fid: Fid = "194".parse().unwrap();
/// assert_eq!(fid.get(), 194);
/// assert!("0".parse::<Fid>().is_err());
/// assert!("alice".parse::<Fid>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fid(u64);

impl Fid {
    /// Create a fid from a number, rejecting zero.
    pub fn new(value: u64) -> Result<Self, Error> {
        if value == 0 {
            return Err(InvalidInputError::Fid {
                value: value.to_string(),
                reason: "must be greater than zero".to_string(),
            }
            .into());
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl FromStr for Fid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidInputError::Fid {
                value: s.to_string(),
                reason: "must be a positive decimal integer".to_string(),
            }
            .into());
        }

        let value = s.parse::<u64>().map_err(|e| InvalidInputError::Fid {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::new(value)
    }
}

impl fmt::Display for Fid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Fid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = u64::deserialize(deserializer)?;
        Fid::new(value).map_err(serde::de::Error::custom)
    }
}
