//! In-process index of materialized handles.
//!
//! The index maps each cached URL to the local handle that stands in for it
//! and maps every handle back to its URL. It exclusively owns the payload
//! behind each handle: replacing or releasing an entry drops the payload and
//! makes the old handle unresolvable. Nothing here is persisted.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Prefix of every handle reference issued by the index.
pub const HANDLE_PREFIX: &str = "blob:favcache/";

/// Local reference string handed to consumers in place of a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalHandle(String);

impl LocalHandle {
    fn from_id(id: u64) -> Self {
        Self(format!("{HANDLE_PREFIX}{id:016x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LocalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A handle together with the payload it stands for.
///
/// Only the index holds these; consumers see the [`LocalHandle`].
#[derive(Debug)]
pub struct MemoryHandle {
    handle: LocalHandle,
    payload: Bytes,
}

impl MemoryHandle {
    pub fn handle(&self) -> &LocalHandle {
        &self.handle
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

#[derive(Debug, Default)]
struct Maps {
    forward: HashMap<String, MemoryHandle>,
    reverse: HashMap<LocalHandle, String>,
}

/// Bidirectional URL ⇄ handle map.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    maps: Mutex<Maps>,
    next_id: AtomicU64,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation leaves both maps consistent before returning, so a
    // poisoned lock still guards valid data.
    fn maps(&self) -> MutexGuard<'_, Maps> {
        self.maps.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a fresh handle for `payload`. Ids are never reused.
    pub fn create_handle(&self, payload: Bytes) -> MemoryHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        MemoryHandle { handle: LocalHandle::from_id(id), payload }
    }

    /// Allocate a handle for `payload` and record it for `url`.
    pub fn materialize(&self, url: &str, payload: Bytes) -> LocalHandle {
        let handle = self.create_handle(payload);
        self.set(url, handle)
    }

    /// Record `handle` for `url` in both directions.
    ///
    /// A handle previously recorded for `url` is invalidated: its reverse
    /// entry is removed and its payload dropped.
    pub fn set(&self, url: &str, handle: MemoryHandle) -> LocalHandle {
        let local = handle.handle.clone();
        let mut maps = self.maps();
        if let Some(previous) = maps.forward.insert(url.to_string(), handle) {
            maps.reverse.remove(&previous.handle);
            tracing::debug!(url = %url, handle = %previous.handle, "replaced memory handle");
        }
        maps.reverse.insert(local.clone(), url.to_string());
        local
    }

    /// Handle currently recorded for `url`.
    pub fn lookup(&self, url: &str) -> Option<LocalHandle> {
        self.maps().forward.get(url).map(|h| h.handle.clone())
    }

    /// URL a handle reference was issued for.
    pub fn reverse_lookup(&self, handle: &str) -> Option<String> {
        self.maps().reverse.get(&LocalHandle(handle.to_string())).cloned()
    }

    /// Bytes behind a live handle reference.
    pub fn payload(&self, handle: &str) -> Option<Bytes> {
        let maps = self.maps();
        let url = maps.reverse.get(&LocalHandle(handle.to_string()))?;
        maps.forward.get(url).map(|h| h.payload.clone())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.maps().forward.contains_key(url)
    }

    /// Drop the entry for `url` in both directions. Returns true if one existed.
    pub fn release(&self, url: &str) -> bool {
        let mut maps = self.maps();
        match maps.forward.remove(url) {
            Some(released) => {
                maps.reverse.remove(&released.handle);
                tracing::debug!(url = %url, handle = %released.handle, "released memory handle");
                true
            }
            None => false,
        }
    }

    /// Release every entry. Returns how many were released.
    pub fn clear(&self) -> usize {
        let mut maps = self.maps();
        let released = maps.forward.len();
        maps.forward.clear();
        maps.reverse.clear();
        released
    }

    pub fn len(&self) -> usize {
        self.maps().forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// True for references that already point at local data.
pub fn is_local_reference(value: &str) -> bool {
    value.starts_with("blob:") || value.starts_with("data:")
}
