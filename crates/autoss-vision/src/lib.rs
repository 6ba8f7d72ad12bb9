//! Image tagging for autoss.
//!
//! A [`Tagger`] turns one frame image into its Tag Set: an ordered list of
//! distinct tag strings. Implementations report failures as [`TagError`];
//! deciding what a failure means for the frame is the caller's job.

mod api;
mod mock;

pub use api::{ComputerVisionConfig, ComputerVisionTagger};
pub use mock::{MockResponse, MockTagger};

use async_trait::async_trait;
use thiserror::Error;

/// Error type for tagging operations.
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Pluggable image tagger.
#[async_trait]
pub trait Tagger: Send + Sync {
    /// Tag one encoded image (JPEG bytes).
    async fn tag_image(&self, image: &[u8]) -> Result<Vec<String>, TagError>;
}

/// Drop empty and repeated tags, keeping first occurrences in order.
pub fn dedupe_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
