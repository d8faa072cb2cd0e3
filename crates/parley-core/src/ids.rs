//! Identifier newtypes.
//!
//! Backends in this family disagree on id shapes: the duplex chat server hands
//! out integer primary keys while the request/response server returns UUID
//! strings. Every id keeps the shape it arrived in, so an integer id goes back
//! over the wire as an integer.
//!
//! Ids minted on the client are UUID v7 strings.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

macro_rules! wire_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(RawId);

        impl $name {
            /// Create a new client-side ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(RawId::Text(Uuid::now_v7().to_string()))
            }

            /// Create from an integer id issued by the backend.
            #[must_use]
            pub fn from_int(n: i64) -> Self {
                Self(RawId::Int(n))
            }

            /// The integer value, if the backend issued an integer id.
            #[must_use]
            pub fn as_int(&self) -> Option<i64> {
                match self.0 {
                    RawId::Int(n) => Some(n),
                    RawId::Text(_) => None,
                }
            }

            /// Short label for display: `#0042` for integers, the first
            /// eight characters for strings.
            #[must_use]
            pub fn label(&self) -> String {
                match &self.0 {
                    RawId::Int(n) => format!("#{n:04}"),
                    RawId::Text(s) => format!("#{}", s.chars().take(8).collect::<String>()),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.0 {
                    RawId::Int(n) => write!(f, "{n}"),
                    RawId::Text(s) => f.write_str(s),
                }
            }
        }

        impl From<i64> for $name {
            fn from(n: i64) -> Self {
                Self(RawId::Int(n))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(RawId::Text(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(RawId::Text(s.to_owned()))
            }
        }
    };
}

wire_id! {
    /// Server-tracked conversation identifier.
    SessionId
}

wire_id! {
    /// Identifier of a persisted chat message.
    MessageId
}

wire_id! {
    /// Identifier of an authenticated user.
    UserId
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_new_is_uuid_v7() {
        let id = SessionId::new();
        let parsed = Uuid::parse_str(&id.to_string()).expect("should be valid UUID");
        assert_eq!(parsed.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn integer_id_roundtrips_as_integer() {
        let id: SessionId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_int(), Some(42));
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }

    #[test]
    fn string_id_roundtrips_as_string() {
        let id: SessionId = serde_json::from_str("\"abc-123\"").unwrap();
        assert_eq!(id.as_int(), None);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-123\"");
    }

    #[test]
    fn numeric_looking_string_stays_a_string() {
        let id: SessionId = serde_json::from_str("\"0042\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0042\"");
    }

    #[test]
    fn label_pads_integers() {
        assert_eq!(SessionId::from_int(7).label(), "#0007");
        assert_eq!(SessionId::from("abcdefghijkl").label(), "#abcdefgh");
    }

    #[test]
    fn display() {
        assert_eq!(SessionId::from_int(12).to_string(), "12");
        assert_eq!(MessageId::from("m-1").to_string(), "m-1");
    }

    #[test]
    fn hash_and_eq() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let _ = set.insert(UserId::from_int(1));
        let _ = set.insert(UserId::from(1));
        assert_eq!(set.len(), 1);
    }
}
