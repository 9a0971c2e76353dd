//! Request identifier correlating an HTTP request, its log lines and its stored row

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique request identifier (UUIDv7, time-ordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new time-ordered request ID
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a request ID from an existing UUID
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a request ID from a string
    ///
    /// # Errors
    /// Returns an error if the string is not a valid UUID
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    /// Get the underlying UUID
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_ids_are_unique() {
        assert_ne!(RequestId::new(), RequestId::new());
    }

    #[test]
    fn parse_accepts_display_output() {
        let original = RequestId::new();
        let parsed = RequestId::parse(&original.to_string()).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(RequestId::parse("not-a-uuid").is_err());
    }
}
