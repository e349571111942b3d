//! Duplicate-delivery guard for update notifications.
//!
//! The hub posts the same update several times; only the first delivery for
//! a given head sha may start a pipeline run. The guard keeps a bounded LRU
//! of recently dispatched shas and performs its check-and-insert under a
//! single lock, so two near-simultaneous duplicates cannot both pass.
//!
//! State is in-memory only: a restart forgets everything, and eviction at
//! capacity re-admits old shas. Both are acceptable because shas are
//! short-lived update heads, not durable keys.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::webhook::WebhookPayload;

/// Decides whether an incoming notification should start a pipeline run.
pub struct UpdateGuard {
    seen: Mutex<LruCache<String, ()>>,
}

impl UpdateGuard {
    /// Creates a guard remembering up to `capacity` recent head shas.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            seen: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns `true` iff the payload is a content update for a dataset
    /// whose head sha has not been dispatched yet.
    ///
    /// On `true` the sha is recorded before returning; rejected payloads
    /// leave the cache untouched.
    pub fn should_process(&self, payload: &WebhookPayload) -> bool {
        if payload.event.action != "update"
            || !payload.event.scope.starts_with("repo.content")
            || payload.repo.kind != "dataset"
        {
            return false;
        }
        // put returns the previous value, so presence-check and insert are
        // one operation under the lock.
        self.seen
            .lock()
            .put(payload.repo.head_sha.clone(), ())
            .is_none()
    }
}
