use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! branded_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::now_v7()))
            }

            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// UUIDv7 keeps ids time-ordered, so creation order and the by-updated
// read order agree for freshly appended records.
branded_id!(TranscriptId, "t");

// User ids are issued by the external identity provider; `from_raw` is the
// production path, `new` exists for tests and local sessions.
branded_id!(UserId, "user");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_id_has_prefix() {
        let id = TranscriptId::new();
        assert!(id.as_str().starts_with("t_"), "got: {id}");
    }

    #[test]
    fn user_id_has_prefix() {
        let id = UserId::new();
        assert!(id.as_str().starts_with("user_"), "got: {id}");
    }

    #[test]
    fn ids_are_unique() {
        let a = TranscriptId::new();
        let b = TranscriptId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn display_and_from_str_roundtrip() {
        let id = TranscriptId::new();
        let s = id.to_string();
        let parsed: TranscriptId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_roundtrip() {
        let id = TranscriptId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: TranscriptId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_raw_preserves_value() {
        let id = UserId::from_raw("8f14e45f-issued-elsewhere");
        assert_eq!(id.as_str(), "8f14e45f-issued-elsewhere");
    }

    #[test]
    fn monotonic_ordering() {
        let ids: Vec<TranscriptId> = (0..100).map(|_| TranscriptId::new()).collect();
        for w in ids.windows(2) {
            assert!(w[0].as_str() < w[1].as_str(), "not monotonic: {} >= {}", w[0], w[1]);
        }
    }
}
