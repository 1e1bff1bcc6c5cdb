//! Per-slug serialization for find-or-create.
//!
//! Two find-or-create calls for the same slug on the same client would
//! otherwise both miss the lookup and both create. Running lookup and create
//! under a lock keyed by `(collection, slug)` closes that window within one
//! process. Other clients can still race; the server's `term_exists`
//! rejection is what catches those.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
pub(crate) struct SlugLocks {
    locks: Mutex<HashMap<(&'static str, String), Arc<Mutex<()>>>>,
}

impl SlugLocks {
    /// Run `f` while holding the lock for `(collection, slug)`.
    ///
    /// Entries are never evicted; the map grows with the number of distinct
    /// slugs this client has looked up.
    pub(crate) fn with_lock<R>(&self, collection: &'static str, slug: &str, f: impl FnOnce() -> R) -> R {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry((collection, slug.to_string())).or_default())
        };
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}
