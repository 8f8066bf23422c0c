//! Upload session tracker
//!
//! Ordered collection of [`FileEntry`] records for one session. Entries are only ever
//! mutated through [`UploadSession::add`], [`UploadSession::update`] and
//! [`UploadSession::remove`].

use tracing::debug;

use crate::entry::{EntryId, EntryPatch, FileEntry};

/// Entries of one session, in arrival order
#[derive(Debug, Default)]
pub struct UploadSession {
    entries: Vec<FileEntry>,
}

impl UploadSession {
    /// Empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends entries in arrival order
    ///
    /// An entry whose id is already tracked is dropped.
    pub fn add(&mut self, entries: impl IntoIterator<Item = FileEntry>) {
        for entry in entries {
            if self.contains(entry.id()) {
                debug!(entry = %entry.id(), "Ignoring duplicate entry");
                continue;
            }
            self.entries.push(entry);
        }
    }

    /// Applies `patch` to the entry with `id`; returns false when no such entry exists
    pub fn update(&mut self, id: EntryId, patch: EntryPatch) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id() == id) {
            Some(entry) => {
                entry.apply(patch);
                true
            }
            None => {
                debug!(entry = %id, "Update for unknown entry");
                false
            }
        }
    }

    /// Removes the entry with `id`, releasing its preview
    pub fn remove(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id() != id);
        before != self.entries.len()
    }

    /// Entry with `id`
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&FileEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Whether an entry with `id` is tracked
    #[must_use]
    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// Entries in arrival order
    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Number of tracked entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry is tracked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
