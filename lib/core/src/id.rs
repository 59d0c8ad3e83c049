//! Strongly-typed identifiers.
//!
//! Identifiers are ULIDs rendered with a short type prefix (`sess_…`,
//! `turn_…`) so they stay readable in logs and API payloads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Generates a ULID-backed identifier type with a display prefix.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        /// Accepts both the prefixed display form and a bare ULID.
        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ulid::from_str(raw).map(Self).map_err(|e| ParseIdError {
                    id_type: stringify!($name),
                    reason: e.to_string(),
                })
            }
        }
    };
}

define_id!(
    /// Unique identifier for a chat session.
    ConversationSessionId,
    "sess"
);

define_id!(
    /// Unique identifier for a single turn (one user utterance and its rounds).
    TurnId,
    "turn"
);
