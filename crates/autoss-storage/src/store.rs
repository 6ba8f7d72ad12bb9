//! Backend-neutral document store interface.

use async_trait::async_trait;
use serde_json::Value;

use autoss_types::FrameId;

use crate::error::StoreError;

/// One logical collection of JSON documents.
///
/// Backends report every failure; deciding whether a failure is fatal is up
/// to the caller (see [`crate::RecordGateway`]).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Human-readable collection name for logs.
    fn name(&self) -> &str;

    /// Create a new document. Fails with [`StoreError::Conflict`] if `id`
    /// already exists. Returns the document as stored.
    async fn insert(&self, id: &str, document: &Value) -> Result<Value, StoreError>;

    /// Find the document whose `video`, `camera_no` and `frame_no` fields
    /// all equal `frame`'s. When several match, the first one the backend
    /// yields is returned.
    async fn find(&self, frame: &FrameId) -> Result<Option<Value>, StoreError>;
}

/// Exact-equality predicate on the three identity fields.
pub fn matches_frame(document: &Value, frame: &FrameId) -> bool {
    document.get("video").and_then(Value::as_str) == Some(frame.video.as_str())
        && document.get("camera_no").and_then(Value::as_str) == Some(frame.camera_str().as_str())
        && document.get("frame_no").and_then(Value::as_str) == Some(frame.frame_str().as_str())
}
