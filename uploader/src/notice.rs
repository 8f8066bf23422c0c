//! User-facing notices raised by the uploader

use std::fmt;

/// A file reached storage
pub const UPLOAD_SUCCEEDED: &str = "File uploaded successfully";
/// The transfer to storage failed
pub const UPLOAD_FAILED: &str = "Failed to upload file(s)";
/// The backend refused or failed to presign
pub const PRESIGN_FAILED: &str = "Failed to get presigned url";
/// An entry was removed along with its object
pub const REMOVE_SUCCEEDED: &str = "File removed successfully";
/// Deleting the object failed
pub const REMOVE_FAILED: &str = "Failed to remove file from storage.";
/// Only non-image files were rejected
pub const INVALID_TYPE: &str = "Only image files can be uploaded.";

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Shown as a success toast
    Success,
    /// Shown as an error toast
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text shown to the user
    pub message: String,
}

impl Notice {
    /// Success notice with `message`
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Error notice with `message`
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Batch held more valid files than `max_files`
    #[must_use]
    pub fn too_many_files(max_files: usize) -> Self {
        Self::error(format!("You can only upload {max_files} files at a time."))
    }

    /// At least one file exceeded the size limit
    #[must_use]
    pub fn file_too_large(max_file_size_mb: u64) -> Self {
        Self::error(format!("The file size exceeds {max_file_size_mb}MB limit."))
    }

    /// Whether the notice reports a failure
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.level, NoticeLevel::Error)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.level {
            NoticeLevel::Success => write!(f, "✅ {}", self.message),
            NoticeLevel::Error => write!(f, "❌ {}", self.message),
        }
    }
}
