//! Request and response values exchanged between the application, the agent
//! and the network.
use cacheward_cache::{RequestKey, Snapshot};
use url::Url;

/// Outbound request issued by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// Payload, forwarded untouched. Not part of the cache key.
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: impl Into<String>, url: Url) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            url,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// Parse `url` and build a GET request for it.
    pub fn parse_get(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::get(Url::parse(url)?))
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, &self.url)
    }
}

/// Where a response handed to the application came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    Fallback,
}

/// Response handed back to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub source: ResponseSource,
}

impl Response {
    /// Serve a stored snapshot as is.
    pub fn from_snapshot(snapshot: Snapshot, source: ResponseSource) -> Self {
        Self {
            status: snapshot.status,
            headers: snapshot.headers,
            body: snapshot.body,
            source,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A response just read off the network.
///
/// There is no way to get at the body other than [`Fetched::split`], which
/// yields the caller's response and the snapshot to store as two independent
/// copies, or [`Fetched::into_snapshot`] / [`Fetched::passthrough`] when only
/// one side is needed.
#[derive(Debug)]
pub struct Fetched {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Fetched {
    pub fn new(
        status: u16,
        headers: Vec<(String, String)>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Copy for the bucket plus the live response for the caller.
    pub fn split(self) -> (Response, Snapshot) {
        let snapshot =
            Snapshot::new(self.status, self.headers.clone(), self.body.clone());
        let response = Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
            source: ResponseSource::Network,
        };
        (response, snapshot)
    }

    /// Only the stored copy is wanted (install).
    pub fn into_snapshot(self) -> Snapshot {
        Snapshot::new(self.status, self.headers, self.body)
    }

    /// Hand the response over untouched; nothing is stored.
    pub fn passthrough(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
            source: ResponseSource::Network,
        }
    }
}
