//! Shared per-content view state
//!
//! Single-writer-at-a-time, last-write-wins, scoped to the content identity
//! tuple (kind, id, subkey). Holds the playback state embedded videos
//! resume from when a view remounts.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::context::ContentKind;

/// Identity tuple scoping a piece of shared state
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    pub kind: ContentKind,
    pub id: u64,
    pub subkey: String,
}

impl ContentKey {
    pub fn new(kind: ContentKind, id: u64, subkey: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            subkey: subkey.into(),
        }
    }
}

/// Last known playback state for an embedded video
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaybackState {
    pub position_secs: f64,
    pub started: bool,
}

/// In-memory, last-write-wins store for per-content view state
#[derive(Debug, Default)]
pub struct ContentStateStore {
    entries: DashMap<ContentKey, PlaybackState>,
}

impl ContentStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playback(&self, key: &ContentKey) -> Option<PlaybackState> {
        self.entries.get(key).map(|entry| *entry)
    }

    /// Record the last known position; marks the video as started
    pub fn record_position(&self, key: ContentKey, position_secs: f64) {
        self.entries
            .entry(key)
            .and_modify(|state| {
                state.position_secs = position_secs;
                state.started = true;
            })
            .or_insert(PlaybackState {
                position_secs,
                started: true,
            });
    }

    pub fn mark_started(&self, key: ContentKey) {
        self.entries
            .entry(key)
            .and_modify(|state| state.started = true)
            .or_insert(PlaybackState {
                position_secs: 0.0,
                started: true,
            });
    }

    pub fn clear(&self, key: &ContentKey) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flushes the last seen playback position into the store when dropped
///
/// Best-effort, fire-on-teardown: the host view updates the guard while the
/// player runs, and the drop path writes whatever was seen last. A guard
/// that was never updated writes nothing.
pub struct PlaybackGuard {
    store: Arc<ContentStateStore>,
    key: ContentKey,
    position_bits: AtomicU64,
    dirty: AtomicBool,
}

impl PlaybackGuard {
    pub fn new(store: Arc<ContentStateStore>, key: ContentKey) -> Self {
        Self {
            store,
            key,
            position_bits: AtomicU64::new(0),
            dirty: AtomicBool::new(false),
        }
    }

    /// Track the current position; cheap enough to call every tick
    pub fn set_position(&self, secs: f64) {
        self.position_bits.store(secs.to_bits(), Ordering::Relaxed);
        self.dirty.store(true, Ordering::Relaxed);
    }
}

impl Drop for PlaybackGuard {
    fn drop(&mut self) {
        if self.dirty.load(Ordering::Relaxed) {
            let position = f64::from_bits(self.position_bits.load(Ordering::Relaxed));
            self.store.record_position(self.key.clone(), position);
        }
    }
}
