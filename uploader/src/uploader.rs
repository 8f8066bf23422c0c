//! Session owner tying the drop surface, the tracker and the transfer engine together

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::api::UploadApi;
use crate::drop_surface::{evaluate_batch, DropLimits};
use crate::entry::{EntryId, EntryPatch, FileEntry, LocalFile};
use crate::error::RemoveError;
use crate::notice::Notice;
use crate::preview::PreviewRegistry;
use crate::session::UploadSession;
use crate::transfer::{self, EventSender, SessionEvent};

/// Single owner of an [`UploadSession`]
///
/// Transfers and deletes run as tokio tasks and report back through a channel; the
/// session only changes when [`Uploader::pump`], [`Uploader::step`] or
/// [`Uploader::settle`] apply those events. Must be used inside a tokio runtime.
pub struct Uploader<A: ?Sized> {
    api: Arc<A>,
    limits: DropLimits,
    session: UploadSession,
    previews: PreviewRegistry,
    tasks: JoinSet<()>,
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    notices: Vec<Notice>,
}

impl<A> Uploader<A>
where
    A: UploadApi + ?Sized + 'static,
{
    /// Uploader with an empty session, admitting batches within `limits`
    #[must_use]
    pub fn new(api: Arc<A>, limits: DropLimits) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            api,
            limits,
            session: UploadSession::new(),
            previews: PreviewRegistry::new(),
            tasks: JoinSet::new(),
            events_tx,
            events_rx,
            notices: Vec::new(),
        }
    }

    /// Admits a dropped batch and starts uploading every accepted file
    ///
    /// Returns the ids of the new entries in arrival order. Rejections only
    /// produce notices.
    pub fn drop_files(&mut self, batch: Vec<LocalFile>) -> Vec<EntryId> {
        let verdict = evaluate_batch(batch, &self.limits);
        self.notices.extend(verdict.notices);

        let entries: Vec<FileEntry> = verdict
            .accepted
            .into_iter()
            .map(|file| {
                let preview = self.previews.create(&file);
                FileEntry::new(file, preview)
            })
            .collect();

        let started: Vec<(EntryId, LocalFile)> = entries
            .iter()
            .map(|entry| (entry.id(), entry.file().clone()))
            .collect();
        self.session.add(entries);

        for (id, file) in &started {
            self.session.update(*id, EntryPatch::upload_started());

            let api = Arc::clone(&self.api);
            let file = file.clone();
            let events = self.events_tx.clone();
            let id = *id;
            self.tasks.spawn(async move {
                transfer::upload_file(api.as_ref(), id, file, events).await;
            });
        }

        info!(accepted = started.len(), "Batch admitted");
        started.into_iter().map(|(id, _)| id).collect()
    }

    /// Starts removing the entry with `id`
    ///
    /// The preview is released and the entry marked deleting right away; the entry
    /// leaves the session once the backend confirms the delete.
    ///
    /// # Errors
    ///
    /// Refuses entries that are unknown, still uploading, already being removed, or
    /// that never received a storage key
    pub fn remove(&mut self, id: EntryId) -> Result<(), RemoveError> {
        let entry = self.session.get(id).ok_or(RemoveError::NotFound(id))?;
        if entry.is_uploading() {
            return Err(RemoveError::Uploading(id));
        }
        if entry.is_deleting() {
            return Err(RemoveError::AlreadyDeleting(id));
        }
        let key = entry
            .storage_key()
            .ok_or(RemoveError::MissingStorageKey(id))?
            .to_string();

        self.session.update(id, EntryPatch::delete_started());

        let api = Arc::clone(&self.api);
        let events = self.events_tx.clone();
        self.tasks.spawn(async move {
            transfer::delete_file(api.as_ref(), id, key, events).await;
        });

        Ok(())
    }

    /// Applies every event already queued, without waiting
    pub fn pump(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    /// Waits for the next event or task completion and applies it
    ///
    /// Returns `false` once no task is running and the queue is drained.
    pub async fn step(&mut self) -> bool {
        if self.tasks.is_empty() {
            self.pump();
            return false;
        }

        let event = tokio::select! {
            event = self.events_rx.recv() => event,
            joined = self.tasks.join_next() => {
                if let Some(Err(e)) = joined {
                    warn!("Transfer task failed: {e}");
                }
                None
            }
        };

        if let Some(event) = event {
            self.apply(event);
        }
        true
    }

    /// Runs until every transfer and delete has finished and its events are applied
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Update { id, patch } => {
                self.session.update(id, patch);
            }
            SessionEvent::Remove { id } => {
                self.session.remove(id);
            }
            SessionEvent::Notify(notice) => {
                if notice.is_error() {
                    warn!("{}", notice.message);
                } else {
                    info!("{}", notice.message);
                }
                self.notices.push(notice);
            }
        }
    }

    /// Entries in arrival order
    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        self.session.entries()
    }

    /// Entry with `id`, if still tracked
    #[must_use]
    pub fn entry(&self, id: EntryId) -> Option<&FileEntry> {
        self.session.get(id)
    }

    /// Limits applied to dropped batches
    #[must_use]
    pub const fn limits(&self) -> &DropLimits {
        &self.limits
    }

    /// Registry holding the entries' previews
    #[must_use]
    pub const fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Notices raised since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Number of transfers and deletes still running
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }
}
