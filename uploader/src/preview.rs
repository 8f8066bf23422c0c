//! Client-local thumbnails for entries
//!
//! A [`PreviewHandle`] owns one slot in its [`PreviewRegistry`]; dropping the handle
//! releases the slot, so release happens exactly once on every path that destroys it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bytes::Bytes;

use crate::entry::LocalFile;

#[derive(Debug, Default)]
struct Slots {
    next_id: u64,
    previews: HashMap<u64, Bytes>,
}

fn lock(slots: &Mutex<Slots>) -> MutexGuard<'_, Slots> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of live previews
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    slots: Arc<Mutex<Slots>>,
}

impl PreviewRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a preview of `file` and returns the handle owning it
    #[must_use]
    pub fn create(&self, file: &LocalFile) -> PreviewHandle {
        let id = {
            let mut slots = lock(&self.slots);
            let id = slots.next_id;
            slots.next_id += 1;
            slots.previews.insert(id, file.data().clone());
            id
        };

        PreviewHandle {
            id,
            slots: Arc::downgrade(&self.slots),
        }
    }

    /// Thumbnail data behind `handle`
    #[must_use]
    pub fn get(&self, handle: &PreviewHandle) -> Option<Bytes> {
        lock(&self.slots).previews.get(&handle.id).cloned()
    }

    /// Number of previews not yet released
    #[must_use]
    pub fn live_count(&self) -> usize {
        lock(&self.slots).previews.len()
    }
}

/// Owning handle to a registered preview
pub struct PreviewHandle {
    id: u64,
    slots: Weak<Mutex<Slots>>,
}

impl PreviewHandle {
    /// Session-local URL the rendering layer can reference the preview by
    #[must_use]
    pub fn url(&self) -> String {
        format!("preview://{}", self.id)
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle").field("id", &self.id).finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            lock(&slots).previews.remove(&self.id);
        }
    }
}
