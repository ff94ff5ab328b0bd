//! External-process layer for the loopclip service.
//!
//! This crate provides:
//! - Engine binary resolution (yt-dlp, ffmpeg)
//! - Metadata resolution via yt-dlp's JSON dump mode
//! - Transcode command building
//! - The per-request streaming pipeline orchestrator

pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod tools;
pub mod transcode;

pub use error::{MediaError, MediaResult};
pub use metadata::{check_range_against_duration, resolve_metadata, MetadataOptions, SourceMetadata};
pub use pipeline::{AudioPipeline, PipelineCancel};
pub use tools::ToolPaths;
pub use transcode::{loop_fade_filter, TranscodeCommand, AUDIO_BITRATE, AUDIO_CODEC, FADE_SECS};
