//! In-memory response cache
//!
//! Maps a request identity (method + path) to the recorded response. The cache
//! is filled once by the fixture loader and only read afterwards, so it is
//! shared between connection tasks behind an `Arc` without any locking.

use std::collections::HashMap;
use std::collections::hash_map::Keys;
use std::fmt;

/// Identity of a request: the HTTP method token and the URL path
///
/// Two keys are equal only if both fields are byte-identical. No case folding
/// or trailing-slash normalization is performed.
///
/// # Examples
///
/// ```
/// use nucklee::RequestKey;
///
/// let key = RequestKey::new("GET", "/hello");
/// assert_eq!(key.method(), "GET");
/// assert_eq!(key.path(), "/hello");
/// assert_ne!(key, RequestKey::new("GET", "/hello/"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: String,
    path: String,
}

impl RequestKey {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A recorded response: raw headers and body text
///
/// The default value is the empty record (no headers, empty body), which is
/// what a cache miss is answered with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseRecord {
    /// Header name to value, one value per name
    pub headers: HashMap<String, String>,
    /// Response payload, verbatim from the fixture
    pub body: String,
}

impl ResponseRecord {
    pub fn new(headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }
}

/// Lookup table from [`RequestKey`] to [`ResponseRecord`]
///
/// # Examples
///
/// ```
/// use nucklee::{RequestKey, ResponseCache, ResponseRecord};
///
/// let mut cache = ResponseCache::new();
/// cache.insert(RequestKey::new("GET", "/x"), ResponseRecord::default());
///
/// assert_eq!(cache.len(), 1);
/// assert!(cache.lookup(&RequestKey::new("GET", "/x")).is_some());
/// assert!(cache.lookup(&RequestKey::new("POST", "/x")).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseCache {
    entries: HashMap<RequestKey, ResponseRecord>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing any previous record for the same key
    ///
    /// Returns the replaced record so callers can report overrides.
    pub fn insert(&mut self, key: RequestKey, record: ResponseRecord) -> Option<ResponseRecord> {
        self.entries.insert(key, record)
    }

    /// Exact-match lookup; a miss is `None`, never an error
    pub fn lookup(&self, key: &RequestKey) -> Option<&ResponseRecord> {
        self.entries.get(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> Keys<'_, RequestKey, ResponseRecord> {
        self.entries.keys()
    }
}
