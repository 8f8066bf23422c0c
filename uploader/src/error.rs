use reqwest::StatusCode;
use thiserror::Error;

use crate::entry::EntryId;

/// Failure of a call to the upload backend or the storage bucket
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or its response not read
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Failure inside the client middleware stack
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// The server answered with a non-success status
    #[error("Unexpected status {status}: {message}")]
    Status {
        /// Status returned by the server
        status: StatusCode,
        /// Message from the error body, or the canonical reason
        message: String,
    },
}

/// Result of an [`ApiError`]-returning call
pub type ApiResult<T> = Result<T, ApiError>;

/// Reason a removal was refused before any request was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RemoveError {
    /// No entry with this id is tracked
    #[error("Entry {0} not found")]
    NotFound(EntryId),

    /// The entry's transfer has not finished
    #[error("Entry {0} is still uploading")]
    Uploading(EntryId),

    /// A delete for the entry is already in flight
    #[error("Entry {0} is already being removed")]
    AlreadyDeleting(EntryId),

    /// Presign never succeeded, so there is no object to delete
    #[error("Entry {0} has no storage key")]
    MissingStorageKey(EntryId),
}
