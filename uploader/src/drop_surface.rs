//! Drop surface: batch admission of candidate files
//!
//! Each file is checked for an `image/*` content type and for size first. If more
//! files pass those checks than a batch may hold, every one of them is rejected.

use common_types::{megabytes, MAX_FILES, MAX_FILE_SIZE_MB};
use mime::Mime;
use tracing::debug;

use crate::entry::LocalFile;
use crate::notice::{self, Notice};

/// Admission limits applied to each batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropLimits {
    /// Files a single batch may hold
    pub max_files: usize,
    /// Largest accepted file, in megabytes
    pub max_file_size_mb: u64,
}

impl Default for DropLimits {
    fn default() -> Self {
        Self {
            max_files: MAX_FILES,
            max_file_size_mb: MAX_FILE_SIZE_MB,
        }
    }
}

impl DropLimits {
    /// Largest accepted file, in bytes
    #[must_use]
    pub const fn max_file_size_bytes(&self) -> u64 {
        megabytes(self.max_file_size_mb)
    }
}

/// Why a file was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Content type is not `image/*`
    InvalidType,
    /// File exceeds the size limit
    FileTooLarge,
    /// The batch held more valid files than allowed
    TooManyFiles,
}

/// A rejected file and every reason it failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejection {
    /// The rejected file
    pub file: LocalFile,
    /// Reasons in check order
    pub reasons: Vec<RejectionReason>,
}

/// Outcome of one batch
#[derive(Debug, Default)]
pub struct BatchVerdict {
    /// Accepted files in arrival order
    pub accepted: Vec<LocalFile>,
    /// Rejected files with their reasons
    pub rejected: Vec<FileRejection>,
    /// Notices to show for this batch
    pub notices: Vec<Notice>,
}

/// Whether the declared content type is `image/*`
#[must_use]
pub fn is_image(content_type: &str) -> bool {
    content_type
        .parse::<Mime>()
        .is_ok_and(|mime| mime.type_() == mime::IMAGE)
}

/// Splits a batch into accepted and rejected files and collects the notices to show
#[must_use]
pub fn evaluate_batch(batch: Vec<LocalFile>, limits: &DropLimits) -> BatchVerdict {
    let max_size = limits.max_file_size_bytes();
    let mut verdict = BatchVerdict::default();

    for file in batch {
        let mut reasons = Vec::new();
        if !is_image(file.content_type()) {
            reasons.push(RejectionReason::InvalidType);
        }
        if file.size() > max_size {
            reasons.push(RejectionReason::FileTooLarge);
        }

        if reasons.is_empty() {
            verdict.accepted.push(file);
        } else {
            debug!(file = file.name(), ?reasons, "Rejected file");
            verdict.rejected.push(FileRejection { file, reasons });
        }
    }

    if verdict.accepted.len() > limits.max_files {
        debug!(
            count = verdict.accepted.len(),
            max_files = limits.max_files,
            "Rejected batch over the file limit"
        );
        verdict
            .rejected
            .extend(verdict.accepted.drain(..).map(|file| FileRejection {
                file,
                reasons: vec![RejectionReason::TooManyFiles],
            }));
    }

    let has_reason =
        |reason| verdict.rejected.iter().any(|rejection| rejection.reasons.contains(&reason));

    let mut notices = Vec::new();
    if has_reason(RejectionReason::TooManyFiles) {
        notices.push(Notice::too_many_files(limits.max_files));
    }
    if has_reason(RejectionReason::FileTooLarge) {
        notices.push(Notice::file_too_large(limits.max_file_size_mb));
    }
    if verdict
        .rejected
        .iter()
        .any(|rejection| rejection.reasons == [RejectionReason::InvalidType])
    {
        notices.push(Notice::error(notice::INVALID_TYPE));
    }
    verdict.notices = notices;

    verdict
}
