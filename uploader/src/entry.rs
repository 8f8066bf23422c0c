//! File entries tracked by an upload session

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use uuid::Uuid;

use crate::preview::PreviewHandle;

/// Content type used when a file's type cannot be sniffed
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Opaque identifier of an entry, stable for the entry's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Fresh random id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Raw file content plus the metadata declared for it
///
/// Cloning is cheap: the content is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    name: String,
    content_type: String,
    data: Bytes,
}

impl LocalFile {
    /// Wraps in-memory content declared as `content_type`
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Reads a file from disk, sniffing its content type from the leading bytes
    ///
    /// Formats without a magic number, such as SVG, are typed by extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        // Text sniffing only sees markup, so an SVG with an XML prolog reads as text/xml
        let content_type = match infer::get(&data) {
            Some(kind) if kind.matcher_type() != infer::MatcherType::Text => kind.mime_type(),
            sniffed => content_type_from_extension(path)
                .or_else(|| sniffed.map(|kind| kind.mime_type()))
                .unwrap_or(FALLBACK_CONTENT_TYPE),
        };
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy())
            .into_owned();

        Ok(Self::new(name, content_type, data))
    }

    /// File name, without any directory part
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared or sniffed MIME type
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Size in bytes
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// File content
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }
}

/// Content type implied by the file extension, for image formats
fn content_type_from_extension(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_lowercase();

    let content_type = match extension.as_str() {
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(content_type)
}

/// Lifecycle record of one accepted file
///
/// Fields are only mutated through [`crate::session::UploadSession`].
#[derive(Debug)]
pub struct FileEntry {
    id: EntryId,
    file: LocalFile,
    storage_key: Option<String>,
    uploading: bool,
    progress: u8,
    is_deleting: bool,
    error: bool,
    preview: Option<PreviewHandle>,
}

impl FileEntry {
    /// Fresh entry for a just-accepted file
    #[must_use]
    pub fn new(file: LocalFile, preview: PreviewHandle) -> Self {
        Self {
            id: EntryId::new(),
            file,
            storage_key: None,
            uploading: false,
            progress: 0,
            is_deleting: false,
            error: false,
            preview: Some(preview),
        }
    }

    /// Id of the entry
    #[must_use]
    pub const fn id(&self) -> EntryId {
        self.id
    }

    /// File the entry tracks
    #[must_use]
    pub const fn file(&self) -> &LocalFile {
        &self.file
    }

    /// Key issued by the presign service, once known
    #[must_use]
    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    /// Whether the transfer is in flight
    #[must_use]
    pub const fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Upload progress in percent
    #[must_use]
    pub const fn progress(&self) -> u8 {
        self.progress
    }

    /// Whether a delete is in flight
    #[must_use]
    pub const fn is_deleting(&self) -> bool {
        self.is_deleting
    }

    /// Whether the most recent upload or delete attempt failed
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.error
    }

    /// Preview handle, until the entry is removed
    #[must_use]
    pub const fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    /// Whether the remove affordance is enabled for this entry
    #[must_use]
    pub const fn can_remove(&self) -> bool {
        !self.uploading && !self.is_deleting
    }

    pub(crate) fn apply(&mut self, patch: EntryPatch) {
        // A bare progress report only counts while the transfer is in flight; the body
        // stream can still be drained after storage has already answered
        let progress_applies = patch.uploading.is_some() || self.uploading;

        if let Some(uploading) = patch.uploading {
            self.uploading = uploading;
        }
        if let Some(progress) = patch.progress.filter(|_| progress_applies) {
            self.progress = progress.min(100);
        }
        if let Some(key) = patch.storage_key {
            self.storage_key = Some(key);
        }
        if let Some(is_deleting) = patch.is_deleting {
            self.is_deleting = is_deleting;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
        if patch.release_preview {
            // Dropping the handle releases the preview
            self.preview = None;
        }

        debug_assert!(
            !(self.uploading && self.is_deleting),
            "entry {} is uploading and deleting at once",
            self.id
        );
    }
}

/// Partial mutation of a [`FileEntry`]; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    /// New transfer flag
    pub uploading: Option<bool>,
    /// New progress in percent, capped at 100
    pub progress: Option<u8>,
    /// Storage key issued by presign
    pub storage_key: Option<String>,
    /// New delete flag
    pub is_deleting: Option<bool>,
    /// New error flag
    pub error: Option<bool>,
    /// Drops the entry's preview handle
    pub release_preview: bool,
}

impl EntryPatch {
    /// Transfer has begun
    #[must_use]
    pub fn upload_started() -> Self {
        Self {
            uploading: Some(true),
            ..Self::default()
        }
    }

    /// Records the key issued by presign
    #[must_use]
    pub fn storage_key(key: impl Into<String>) -> Self {
        Self {
            storage_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// In-flight progress report
    #[must_use]
    pub fn progress(percent: u8) -> Self {
        Self {
            progress: Some(percent),
            ..Self::default()
        }
    }

    /// Storage accepted the object
    #[must_use]
    pub fn upload_succeeded() -> Self {
        Self {
            uploading: Some(false),
            progress: Some(100),
            error: Some(false),
            ..Self::default()
        }
    }

    /// Presign or transfer failed
    #[must_use]
    pub fn upload_failed() -> Self {
        Self {
            uploading: Some(false),
            progress: Some(0),
            error: Some(true),
            ..Self::default()
        }
    }

    /// Marks the delete in flight and releases the preview right away
    #[must_use]
    pub fn delete_started() -> Self {
        Self {
            is_deleting: Some(true),
            release_preview: true,
            ..Self::default()
        }
    }

    /// Delete failed; the entry stays for another attempt
    #[must_use]
    pub fn delete_failed() -> Self {
        Self {
            is_deleting: Some(false),
            error: Some(true),
            ..Self::default()
        }
    }
}
