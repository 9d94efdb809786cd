//! Generated-answer cache.
//!
//! Keyed by a SHA-256 digest of the (prompt, context) pair. Eviction is by
//! insertion order: when full, the oldest inserted entry goes first, no
//! matter how recently it was read.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};

/// Content hash of a (prompt, context) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn new(prompt: &str, context: &str) -> Self {
        let mut hasher = Sha256::new();
        // Length prefix keeps ("ab", "c") and ("a", "bc") apart.
        hasher.update((prompt.len() as u64).to_le_bytes());
        hasher.update(prompt.as_bytes());
        hasher.update(context.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex()[..12])
    }
}

struct Ring {
    order: VecDeque<CacheKey>,
    entries: HashMap<CacheKey, String>,
}

pub struct ResponseCache {
    capacity: usize,
    ring: Mutex<Ring>,
}

impl ResponseCache {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            ring: Mutex::new(Ring {
                order: VecDeque::with_capacity(capacity),
                entries: HashMap::with_capacity(capacity),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Store an answer. Overwriting an existing key keeps its original
    /// insertion position.
    pub fn put(&self, key: CacheKey, value: String) {
        let mut ring = self.lock();

        if let Some(existing) = ring.entries.get_mut(&key) {
            *existing = value;
            return;
        }

        while ring.order.len() >= self.capacity {
            match ring.order.pop_front() {
                Some(oldest) => {
                    ring.entries.remove(&oldest);
                }
                None => break,
            }
        }

        ring.order.push_back(key);
        ring.entries.insert(key, value);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut ring = self.lock();
        let removed = ring.entries.len();
        ring.entries.clear();
        ring.order.clear();
        removed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
