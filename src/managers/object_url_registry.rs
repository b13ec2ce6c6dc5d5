//! Object URL registry.
//!
//! Downloaded payloads are exposed to the presenter as short-lived
//! `blob:` URLs. Every URL created here must be revoked, either right after
//! use or by a one-shot deferred revocation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::task::AbortHandle;
use tracing::debug;
use uuid::Uuid;

/// A live object URL and the payload it resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectUrl {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Default)]
struct RegistryState {
    live: HashMap<String, ObjectUrl>,
    pending: HashMap<String, AbortHandle>,
}

/// Shared registry of live object URLs. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrlRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a payload under a fresh `blob:` URL.
    pub fn create(&self, bytes: Bytes, content_type: Option<String>) -> ObjectUrl {
        let object = ObjectUrl {
            url: format!("blob:{}", Uuid::new_v4()),
            content_type,
            bytes,
        };
        if let Ok(mut state) = self.state.lock() {
            state.live.insert(object.url.clone(), object.clone());
        }
        debug!(url = %object.url, "object URL created");
        object
    }

    pub fn resolve(&self, url: &str) -> Option<ObjectUrl> {
        self.state.lock().ok()?.live.get(url).cloned()
    }

    /// Releases a URL. Returns whether it was still live.
    pub fn revoke(&self, url: &str) -> bool {
        let Ok(mut state) = self.state.lock() else {
            return false;
        };
        if let Some(handle) = state.pending.remove(url) {
            handle.abort();
        }
        let revoked = state.live.remove(url).is_some();
        if revoked {
            debug!(%url, "object URL revoked");
        }
        revoked
    }

    /// Revokes `url` once `delay` has elapsed. Must be called within a tokio runtime.
    ///
    /// URLs that are not live are ignored. A second call for the same URL
    /// replaces the earlier timer.
    pub fn revoke_after(&self, url: &str, delay: Duration) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if !state.live.contains_key(url) {
            return;
        }
        let registry = self.clone();
        let target = url.to_string();
        // Lock stays held until the handle is recorded; the task needs it to finish.
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Ok(mut state) = registry.state.lock() {
                state.pending.remove(&target);
                if state.live.remove(&target).is_some() {
                    debug!(url = %target, "object URL revoked after delay");
                }
            }
        });
        if let Some(previous) = state.pending.insert(url.to_string(), handle.abort_handle()) {
            previous.abort();
        }
    }

    /// Aborts pending deferred revocations and revokes every live URL.
    pub fn shutdown(&self) -> usize {
        let Ok(mut state) = self.state.lock() else {
            return 0;
        };
        for (_, handle) in state.pending.drain() {
            handle.abort();
        }
        let released = state.live.len();
        state.live.clear();
        if released > 0 {
            debug!(released, "object URLs released on shutdown");
        }
        released
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().map(|s| s.live.len()).unwrap_or(0)
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or(0)
    }
}
