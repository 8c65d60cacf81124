//! Request dispatching
//!
//! Turns an inbound [`RequestKey`] into the reply the transport writes back.

use crate::cache::{RequestKey, ResponseCache, ResponseRecord};
use http::StatusCode;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// How a request without a matching fixture is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissPolicy {
    /// `200 OK` with no headers and an empty body
    #[default]
    EmptyOk,
    /// `404 Not Found` with no headers and an empty body
    NotFound,
}

/// Reply for one inbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<'a> {
    pub status: StatusCode,
    pub record: Cow<'a, ResponseRecord>,
    /// Whether a fixture matched the request
    pub matched: bool,
}

/// Answers requests from a loaded [`ResponseCache`]
///
/// # Examples
///
/// ```
/// use nucklee::{Dispatcher, MissPolicy, RequestKey, ResponseCache, ResponseRecord};
/// use std::sync::Arc;
///
/// let mut cache = ResponseCache::new();
/// cache.insert(RequestKey::new("GET", "/hello"), ResponseRecord::new(Default::default(), "hi"));
///
/// let dispatcher = Dispatcher::new(Arc::new(cache), MissPolicy::EmptyOk);
/// let reply = dispatcher.dispatch(&RequestKey::new("GET", "/hello"));
/// assert!(reply.matched);
/// assert_eq!(reply.record.body, "hi");
///
/// let miss = dispatcher.dispatch(&RequestKey::new("GET", "/nope"));
/// assert_eq!(miss.status, 200);
/// assert!(miss.record.body.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Dispatcher {
    cache: Arc<ResponseCache>,
    miss_policy: MissPolicy,
}

impl Dispatcher {
    pub fn new(cache: Arc<ResponseCache>, miss_policy: MissPolicy) -> Self {
        Self { cache, miss_policy }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn miss_policy(&self) -> MissPolicy {
        self.miss_policy
    }

    pub fn dispatch(&self, key: &RequestKey) -> Reply<'_> {
        match self.cache.lookup(key) {
            Some(record) => {
                debug!(%key, "Fixture matched");
                Reply {
                    status: StatusCode::OK,
                    record: Cow::Borrowed(record),
                    matched: true,
                }
            }
            None => {
                debug!(%key, policy = ?self.miss_policy, "No fixture matched");
                let status = match self.miss_policy {
                    MissPolicy::EmptyOk => StatusCode::OK,
                    MissPolicy::NotFound => StatusCode::NOT_FOUND,
                };
                Reply {
                    status,
                    record: Cow::Owned(ResponseRecord::default()),
                    matched: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn dispatcher(policy: MissPolicy) -> Dispatcher {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), "text/plane".to_string());
        let mut cache = ResponseCache::new();
        cache.insert(
            RequestKey::new("GET", "/hello"),
            ResponseRecord::new(headers, "Hello World"),
        );
        Dispatcher::new(Arc::new(cache), policy)
    }

    #[test]
    fn test_hit_returns_record_verbatim() {
        let dispatcher = dispatcher(MissPolicy::EmptyOk);
        let reply = dispatcher.dispatch(&RequestKey::new("GET", "/hello"));

        assert!(reply.matched);
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.record.headers["Content-Type"], "text/plane");
        assert_eq!(reply.record.body, "Hello World");
        assert!(matches!(reply.record, Cow::Borrowed(_)));
    }

    #[test]
    fn test_miss_is_empty_ok_by_default() {
        let dispatcher = dispatcher(MissPolicy::default());
        let reply = dispatcher.dispatch(&RequestKey::new("POST", "/hello"));

        assert!(!reply.matched);
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(*reply.record, ResponseRecord::default());
    }

    #[test]
    fn test_miss_not_found_policy() {
        let dispatcher = dispatcher(MissPolicy::NotFound);
        assert_eq!(dispatcher.miss_policy(), MissPolicy::NotFound);
        let reply = dispatcher.dispatch(&RequestKey::new("GET", "/missing"));

        assert!(!reply.matched);
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert!(reply.record.headers.is_empty());
        assert!(reply.record.body.is_empty());
    }
}
