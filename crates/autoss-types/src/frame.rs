//! Frame identity.
//!
//! A frame is addressed by `(video, camera_no, frame_no)`. The numeric parts
//! are kept as integers for ordering and arithmetic; the persisted records
//! carry them as strings (see [`crate::record`]).

use std::fmt;

/// Identifies one frame of one camera of one video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId {
    pub video: String,
    pub camera_no: u32,
    pub frame_no: u64,
}

impl FrameId {
    pub fn new(video: impl Into<String>, camera_no: u32, frame_no: u64) -> Self {
        Self {
            video: video.into(),
            camera_no,
            frame_no,
        }
    }

    /// Derived record key: `{video}_{camera}_{frame}`.
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.video, self.camera_no, self.frame_no)
    }

    /// The temporally following frame of the same camera.
    pub fn successor(&self) -> Self {
        Self {
            video: self.video.clone(),
            camera_no: self.camera_no,
            frame_no: self.frame_no + 1,
        }
    }

    /// Camera number in its persisted string form.
    pub fn camera_str(&self) -> String {
        self.camera_no.to_string()
    }

    /// Frame number in its persisted string form.
    pub fn frame_str(&self) -> String {
        self.frame_no.to_string()
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.video, self.camera_no, self.frame_no)
    }
}
