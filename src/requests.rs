//! In-flight request tracking
//!
//! Every chat call registers an identifier for the duration of the call so that
//! log lines from interleaved calls can be told apart. Entries are removed by
//! [`RequestGuard`] when it is dropped, whichever way the call ends.

use std::sync::Arc;

use dashmap::DashSet;
use uuid::Uuid;

const SUFFIX_LEN: usize = 5;

/// Set of identifiers for calls currently in flight
#[derive(Debug, Clone, Default)]
pub struct ActiveRequests {
    inner: Arc<DashSet<String>>,
}

impl ActiveRequests {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request id with the given prefix
    ///
    /// The id stays in the set until the returned guard is dropped.
    #[must_use = "dropping the guard immediately unregisters the request"]
    pub fn track(&self, prefix: &str) -> RequestGuard {
        let id = new_request_id(prefix);
        self.inner.insert(id.clone());
        tracing::debug!(request_id = %id, in_flight = self.inner.len(), "request started");

        RequestGuard {
            id,
            requests: self.clone(),
        }
    }

    /// Number of requests currently in flight
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no request is in flight
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether the given id is in flight
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains(id)
    }

    /// Snapshot of the ids currently in flight
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.inner.iter().map(|id| id.key().clone()).collect()
    }
}

/// Scoped registration of one request id
#[derive(Debug)]
pub struct RequestGuard {
    id: String,
    requests: ActiveRequests,
}

impl RequestGuard {
    /// The tracked request id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.requests.inner.remove(&self.id);
        tracing::debug!(request_id = %self.id, "request finished");
    }
}

/// Build `<prefix>-<unix millis>-<short random suffix>`
fn new_request_id(prefix: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(SUFFIX_LEN).collect();
    format!("{prefix}-{millis}-{suffix}")
}
