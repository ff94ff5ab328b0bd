//! Shared data models for the loopclip service.
//!
//! This crate is pure: request parsing, validation, and filename
//! derivation, with no I/O and no process handling.

pub mod filename;
pub mod request;
pub mod source_url;

pub use filename::{clip_filename, sanitize_title, DEFAULT_TITLE};
pub use request::{ClipRequest, DownloadRequest, ValidationError};
pub use source_url::{validate_source_url, SourceUrlError};
