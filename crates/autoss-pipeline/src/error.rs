//! Error types for the frame pipeline.

use thiserror::Error;

/// Errors that stop a run before any frame is processed.
///
/// Per-frame problems never show up here; they are logged and counted
/// in the run report instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Frame directory missing or unreadable
    #[error("Cannot read frame directory {path}: {message}")]
    FrameDir { path: String, message: String },
}
