use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error};
use smol_str::{SmolStr, SmolStrBuilder};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{ModerationError, Result};

const S32_CHAR: &[u8] = b"234567abcdefghijklmnopqrstuvwxyz";

fn s32_encode(mut i: u64) -> SmolStr {
    let mut digits = [0u8; 13];
    for slot in digits.iter_mut().rev() {
        *slot = S32_CHAR[(i & 0x1F) as usize];
        i >>= 5;
    }

    let mut builder = SmolStrBuilder::new();
    for c in digits {
        builder.push(c as char);
    }
    builder.finish()
}

fn s32_decode(s: &str) -> u64 {
    s.bytes().fold(0u64, |acc, b| {
        let digit = S32_CHAR.iter().position(|c| *c == b).unwrap_or(0) as u64;
        (acc << 5) | digit
    })
}

static TID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[234567abcdefghij][234567abcdefghijklmnopqrstuvwxyz]{12}$")
        .expect("tid regex is valid")
});

/// Last timestamp handed out by [`Tid::now`], in microseconds.
static LAST_MICROS: AtomicU64 = AtomicU64::new(0);

/// A time-ordered, 13 character base32-sortable identifier.
///
/// The top 53 bits hold a microsecond timestamp and the low 10 bits a clock id,
/// so the string form sorts in creation order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Tid(SmolStr);

impl Tid {
    /// Parses a `Tid` from the given string.
    pub fn new(tid: impl AsRef<str>) -> Result<Self> {
        let tid = tid.as_ref();
        if tid.len() != 13 {
            Err(ModerationError::validation(
                "id",
                format!("identifier must be 13 characters, got {}", tid.len()),
            ))
        } else if !TID_REGEX.is_match(tid) {
            Err(ModerationError::validation(
                "id",
                format!("malformed identifier: {}", tid),
            ))
        } else {
            Ok(Self(SmolStr::new_inline(tid)))
        }
    }

    /// Construct an identifier for the given time and clock id.
    pub fn from_datetime(clock_id: u16, time: chrono::DateTime<chrono::Utc>) -> Self {
        Self::from_micros(clock_id, time.timestamp_micros().max(0) as u64)
    }

    fn from_micros(clock_id: u16, micros: u64) -> Self {
        let tid = (micros << 10) & 0x7FFF_FFFF_FFFF_FC00 | (clock_id as u64 & 0x3FF);
        Self(s32_encode(tid))
    }

    /// Construct a new identifier for the current time.
    ///
    /// Strictly increasing within a process, even when called more than once
    /// per microsecond.
    pub fn now() -> Self {
        let wall = chrono::Utc::now().timestamp_micros().max(0) as u64;
        let prev = LAST_MICROS
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wall.max(last + 1))
            })
            .unwrap_or(wall);
        Self::from_micros(0, wall.max(prev + 1))
    }

    /// Microsecond timestamp encoded in this identifier
    pub fn timestamp_micros(&self) -> u64 {
        s32_decode(&self.0) >> 10
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Tid {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for Tid {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = SmolStr::deserialize(deserializer)?;
        Self::new(&value).map_err(D::Error::custom)
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Tid {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_tids() {
        assert!(Tid::new("3jzfcijpj2z2a").is_ok());
        assert!(Tid::new("7777777777777").is_ok());
        assert!(Tid::new("3zzzzzzzzzzzz").is_ok());
    }

    #[test]
    fn invalid_tids() {
        assert!(Tid::new("3jzfcijpj2z2").is_err());
        assert!(Tid::new("3jzfcijpj2z2aa").is_err());
        assert!(Tid::new("zzzzzzzzzzzzz").is_err());
        assert!(Tid::new("3JZFCIJPJ2Z2A").is_err());
    }

    #[test]
    fn now_is_strictly_increasing() {
        let ids: Vec<Tid> = (0..500).map(|_| Tid::now()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn timestamp_round_trips() {
        let time = chrono::DateTime::from_timestamp_micros(1_700_000_000_123_456).unwrap();
        let tid = Tid::from_datetime(0, time);
        assert_eq!(tid.timestamp_micros(), 1_700_000_000_123_456);
        assert!(Tid::new(tid.as_str()).is_ok());
    }

    #[test]
    fn deserialize_rejects_garbage() {
        let parsed: std::result::Result<Tid, _> = serde_json::from_str("\"not-an-id\"");
        assert!(parsed.is_err());
    }
}
