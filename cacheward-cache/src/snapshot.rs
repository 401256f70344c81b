use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time copy of a response, as written into a bucket.
///
/// Snapshots are never mutated after creation. Anything handed back to a
/// caller is built from a clone, so the stored copy stays intact no matter
/// how the caller consumes its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    /// HTTP response status code
    pub status: u16,
    /// Response headers in the order they were received
    pub headers: Vec<(String, String)>,
    /// The full response body
    pub body: Vec<u8>,
    /// When this snapshot was captured
    pub stored_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(
        status: u16,
        headers: Vec<(String, String)>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            stored_at: Utc::now(),
        }
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup, first match wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether this response may be kept for later plain GETs. Partial
    /// content and `Vary: *` responses are never stored.
    pub fn is_storable(&self) -> bool {
        if self.status == 206 {
            return false;
        }
        !self
            .headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case("vary"))
            .flat_map(|(_, value)| value.split(','))
            .any(|field| field.trim() == "*")
    }
}
