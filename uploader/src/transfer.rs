//! Transfer engine
//!
//! Runs the upload and delete protocols for a single entry. Tasks never touch the
//! session: every state change is sent as a [`SessionEvent`] to the session owner,
//! and events of one entry arrive in the order they were emitted.

use common_types::PresignRequest;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::api::UploadApi;
use crate::entry::{EntryId, EntryPatch, LocalFile};
use crate::notice::{self, Notice};

/// In-flight progress never reaches 100; only a confirmed upload does
const MAX_IN_FLIGHT_PROGRESS: u8 = 99;

/// State change reported by a transfer or delete task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Apply `patch` to the entry
    Update {
        /// Target entry
        id: EntryId,
        /// Fields to change
        patch: EntryPatch,
    },
    /// Drop the entry from the session
    Remove {
        /// Target entry
        id: EntryId,
    },
    /// Show a notice
    Notify(Notice),
}

/// Sending half of the session event channel
pub type EventSender = mpsc::UnboundedSender<SessionEvent>;

fn emit(events: &EventSender, event: SessionEvent) {
    if events.send(event).is_err() {
        debug!("Session closed, dropping event");
    }
}

/// Percentage of `total` covered by `sent`, rounded and capped for in-flight reporting
///
/// Returns `None` for an empty file.
#[must_use]
pub fn progress_percent(sent: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }

    let sent = u128::from(sent.min(total));
    let total = u128::from(total);
    let rounded = (sent * 100 + total / 2) / total;

    Some(u8::try_from(rounded).map_or(MAX_IN_FLIGHT_PROGRESS, |p| p.min(MAX_IN_FLIGHT_PROGRESS)))
}

/// Turns bytes handed to the transport into progress events
///
/// An event is only emitted when the rounded percentage increases.
#[derive(Debug)]
pub struct ProgressReporter {
    id: EntryId,
    total: u64,
    sent: u64,
    last_percent: u8,
    events: EventSender,
}

impl ProgressReporter {
    pub(crate) const fn new(id: EntryId, total: u64, events: EventSender) -> Self {
        Self {
            id,
            total,
            sent: 0,
            last_percent: 0,
            events,
        }
    }

    /// Records `bytes` more bytes as sent
    pub fn advance(&mut self, bytes: usize) {
        self.sent = self.sent.saturating_add(bytes as u64);

        if let Some(percent) = progress_percent(self.sent, self.total) {
            if percent > self.last_percent {
                self.last_percent = percent;
                emit(
                    &self.events,
                    SessionEvent::Update {
                        id: self.id,
                        patch: EntryPatch::progress(percent),
                    },
                );
            }
        }
    }
}

/// Uploads `file` for entry `id`: presign, record the key, then stream the bytes
///
/// The entry is expected to be marked uploading already.
#[instrument(skip(api, file, events), fields(file = file.name(), size = file.size()))]
pub async fn upload_file<A>(api: &A, id: EntryId, file: LocalFile, events: EventSender)
where
    A: UploadApi + ?Sized,
{
    let request = PresignRequest {
        file_name: file.name().to_string(),
        content_type: file.content_type().to_string(),
        size: file.size(),
    };

    let presigned = match api.presign(&request).await {
        Ok(presigned) => presigned,
        Err(e) => {
            warn!("Failed to get presigned url: {e}");
            emit(
                &events,
                SessionEvent::Update {
                    id,
                    patch: EntryPatch::upload_failed(),
                },
            );
            emit(&events, SessionEvent::Notify(Notice::error(notice::PRESIGN_FAILED)));
            return;
        }
    };

    debug!(key = %presigned.key, "Presigned upload");
    emit(
        &events,
        SessionEvent::Update {
            id,
            patch: EntryPatch::storage_key(presigned.key),
        },
    );

    let reporter = ProgressReporter::new(id, file.size(), events.clone());
    match api.put_object(&presigned.presigned_url, &file, reporter).await {
        Ok(()) => {
            debug!("Upload finished");
            emit(
                &events,
                SessionEvent::Update {
                    id,
                    patch: EntryPatch::upload_succeeded(),
                },
            );
            emit(&events, SessionEvent::Notify(Notice::success(notice::UPLOAD_SUCCEEDED)));
        }
        Err(e) => {
            warn!("Failed to upload file: {e}");
            emit(
                &events,
                SessionEvent::Update {
                    id,
                    patch: EntryPatch::upload_failed(),
                },
            );
            emit(&events, SessionEvent::Notify(Notice::error(notice::UPLOAD_FAILED)));
        }
    }
}

/// Deletes the stored object behind entry `id`
///
/// The entry is expected to be marked deleting already.
#[instrument(skip(api, events))]
pub async fn delete_file<A>(api: &A, id: EntryId, key: String, events: EventSender)
where
    A: UploadApi + ?Sized,
{
    match api.delete(&key).await {
        Ok(_) => {
            debug!("Object deleted");
            emit(&events, SessionEvent::Remove { id });
            emit(&events, SessionEvent::Notify(Notice::success(notice::REMOVE_SUCCEEDED)));
        }
        Err(e) => {
            warn!("Failed to delete object: {e}");
            emit(
                &events,
                SessionEvent::Update {
                    id,
                    patch: EntryPatch::delete_failed(),
                },
            );
            emit(&events, SessionEvent::Notify(Notice::error(notice::REMOVE_FAILED)));
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use common_types::{DeleteResponse, PresignResponse};
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::error::{ApiError, ApiResult};

    #[derive(Default)]
    struct MockApi {
        fail_presign: bool,
        fail_put: bool,
        fail_delete: bool,
    }

    fn status_error() -> ApiError {
        ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal Server Error".to_string(),
        }
    }

    #[async_trait]
    impl UploadApi for MockApi {
        async fn presign(&self, request: &PresignRequest) -> ApiResult<PresignResponse> {
            if self.fail_presign {
                return Err(status_error());
            }
            Ok(PresignResponse {
                presigned_url: format!("http://bucket.test/{}", request.file_name),
                key: format!("key-{}", request.file_name),
            })
        }

        async fn put_object(
            &self,
            _url: &str,
            file: &LocalFile,
            mut progress: ProgressReporter,
        ) -> ApiResult<()> {
            for chunk in file.data().chunks(256) {
                progress.advance(chunk.len());
            }
            if self.fail_put {
                return Err(status_error());
            }
            Ok(())
        }

        async fn delete(&self, _key: &str) -> ApiResult<DeleteResponse> {
            if self.fail_delete {
                return Err(status_error());
            }
            Ok(DeleteResponse {
                message: "File deleted successfully".to_string(),
            })
        }
    }

    fn drain(mut rx: UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn progress_values(events: &[SessionEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Update { patch, .. } if patch.storage_key.is_none() => patch.progress,
                _ => None,
            })
            .collect()
    }

    #[test]
    fn progress_rounds_and_caps_below_completion() {
        assert_eq!(progress_percent(0, 1024), Some(0));
        assert_eq!(progress_percent(512, 1024), Some(50));
        assert_eq!(progress_percent(5, 1000), Some(1));
        assert_eq!(progress_percent(4, 1000), Some(0));
        assert_eq!(progress_percent(1000, 1000), Some(99));
        assert_eq!(progress_percent(2000, 1000), Some(99));
        assert_eq!(progress_percent(0, 0), None);
    }

    #[test]
    fn reporter_only_emits_increases() {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = EntryId::new();
        let mut reporter = ProgressReporter::new(id, 1000, tx);

        reporter.advance(1);
        reporter.advance(1);
        reporter.advance(498);
        reporter.advance(0);
        reporter.advance(500);
        drop(reporter);

        let events = drain(rx);
        assert_eq!(progress_values(&events), [50, 99]);
    }

    #[tokio::test]
    async fn successful_upload_reports_key_progress_and_completion() {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = EntryId::new();
        let file = LocalFile::new("a.png", "image/png", vec![7u8; 1024]);

        upload_file(&MockApi::default(), id, file, tx).await;

        let events = drain(rx);
        assert_eq!(
            events.first(),
            Some(&SessionEvent::Update {
                id,
                patch: EntryPatch::storage_key("key-a.png"),
            })
        );
        assert_eq!(progress_values(&events), [25, 50, 75, 99, 100]);
        assert_eq!(
            events.last(),
            Some(&SessionEvent::Notify(Notice::success(notice::UPLOAD_SUCCEEDED)))
        );
    }

    #[tokio::test]
    async fn presign_failure_stops_before_transfer() {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = EntryId::new();
        let api = MockApi {
            fail_presign: true,
            ..MockApi::default()
        };

        upload_file(&api, id, LocalFile::new("a.png", "image/png", vec![0u8; 10]), tx).await;

        assert_eq!(
            drain(rx),
            [
                SessionEvent::Update {
                    id,
                    patch: EntryPatch::upload_failed(),
                },
                SessionEvent::Notify(Notice::error(notice::PRESIGN_FAILED)),
            ]
        );
    }

    #[tokio::test]
    async fn put_failure_resets_progress() {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = EntryId::new();
        let api = MockApi {
            fail_put: true,
            ..MockApi::default()
        };

        upload_file(&api, id, LocalFile::new("a.png", "image/png", vec![0u8; 512]), tx).await;

        let events = drain(rx);
        assert_eq!(
            events[events.len() - 2..].to_vec(),
            [
                SessionEvent::Update {
                    id,
                    patch: EntryPatch::upload_failed(),
                },
                SessionEvent::Notify(Notice::error(notice::UPLOAD_FAILED)),
            ]
        );
    }

    #[tokio::test]
    async fn delete_outcomes() {
        let id = EntryId::new();

        let (tx, rx) = mpsc::unbounded_channel();
        delete_file(&MockApi::default(), id, "key-a.png".to_string(), tx).await;
        assert_eq!(
            drain(rx),
            [
                SessionEvent::Remove { id },
                SessionEvent::Notify(Notice::success(notice::REMOVE_SUCCEEDED)),
            ]
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let api = MockApi {
            fail_delete: true,
            ..MockApi::default()
        };
        delete_file(&api, id, "key-a.png".to_string(), tx).await;
        assert_eq!(
            drain(rx),
            [
                SessionEvent::Update {
                    id,
                    patch: EntryPatch::delete_failed(),
                },
                SessionEvent::Notify(Notice::error(notice::REMOVE_FAILED)),
            ]
        );
    }
}
