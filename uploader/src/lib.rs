//! Client-side uploader
//!
//! Files dropped onto the uploader are admitted in batches, tracked as
//! [`entry::FileEntry`] records, and uploaded straight to the storage bucket through
//! presigned URLs issued by the backend. Removing an entry deletes its object first.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::sync::Arc;
//!
//! use uploader::{api::HttpUploadApi, drop_surface::DropLimits, entry::LocalFile, Uploader};
//!
//! let api = Arc::new(HttpUploadApi::new("http://localhost:8001")?);
//! let mut uploader = Uploader::new(api, DropLimits::default());
//!
//! uploader.drop_files(vec![LocalFile::new("a.png", "image/png", vec![0u8; 1024])]);
//! uploader.settle().await;
//!
//! for notice in uploader.take_notices() {
//!     println!("{notice}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

/// Client for the upload backend and the storage bucket
/// Client for the upload backend and the storage bucket
pub mod api;
/// Client configuration
pub mod config;
pub mod drop_surface;
pub mod entry;
/// Client errors
pub mod error;
pub mod notice;
pub mod preview;
pub mod session;
pub mod transfer;
mod uploader;

pub use uploader::Uploader;
