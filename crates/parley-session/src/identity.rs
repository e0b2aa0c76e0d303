//! Stable opaque session identity.
//!
//! One identifier per profile, created on first use and persisted through
//! an injected key-value store. When the store cannot persist, a fresh
//! identifier is still returned: continuity degrades, the session does
//! not fail.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;
use uuid::Uuid;

/// Storage key under which the identifier lives.
const SESSION_ID_KEY: &str = "session";

/// A minimal key-value storage capability.
pub trait IdentityStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    /// Returns whether the value was durably stored.
    fn put(&self, key: &str, value: &str) -> bool;
}

/// Produces the per-profile session identifier.
pub struct SessionIdentity;

impl SessionIdentity {
    /// Return the stored identifier, or generate and persist a fresh one.
    pub fn get_or_create(store: &dyn IdentityStore) -> String {
        if let Some(existing) = store.get(SESSION_ID_KEY) {
            let existing = existing.trim();
            if !existing.is_empty() {
                return existing.to_string();
            }
        }
        let generated = Uuid::new_v4().to_string();
        if !store.put(SESSION_ID_KEY, &generated) {
            warn!("session identity could not be persisted; a new one will be issued next run");
        }
        generated
    }
}

/// File-backed store: one file per key under a data directory.
pub struct FileIdentityStore {
    dir: PathBuf,
}

impl FileIdentityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl IdentityStore for FileIdentityStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn put(&self, key: &str, value: &str) -> bool {
        if std::fs::create_dir_all(&self.dir).is_err() {
            return false;
        }
        std::fs::write(self.path_for(key), value).is_ok()
    }
}

/// In-memory store for tests and restricted environments.
#[derive(Default)]
pub struct MemoryIdentityStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("identity store poisoned")
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: &str) -> bool {
        self.entries
            .lock()
            .expect("identity store poisoned")
            .insert(key.to_string(), value.to_string());
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
