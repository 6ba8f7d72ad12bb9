//! Frame catalog for one (video, camera) pair.
//!
//! Frames are files named `<video>_<camera>_<frame>.jpg` directly under the
//! frame directory. Anything else is logged and skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use autoss_types::FrameId;

use crate::error::PipelineError;

/// Only extension recognized as a frame image
pub const FRAME_EXTENSION: &str = "jpg";

/// Why a file was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("not a .jpg file")]
    Extension,

    #[error("expected <video>_<camera>_<frame>, got {0} token(s)")]
    TokenCount(usize),

    #[error("camera token {0:?} is not a non-negative integer")]
    Camera(String),

    #[error("frame token {0:?} is not a non-negative integer")]
    Frame(String),

    #[error("video {found:?} does not match {expected:?}")]
    Video { expected: String, found: String },

    #[error("camera {found} does not match {expected}")]
    CameraMismatch { expected: u32, found: u32 },
}

/// Parse a frame file name into its identity.
pub fn parse_frame_name(path: &Path) -> Result<FrameId, Rejection> {
    if path.extension().and_then(|e| e.to_str()) != Some(FRAME_EXTENSION) {
        return Err(Rejection::Extension);
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    let tokens: Vec<&str> = stem.split('_').collect();
    let [video, camera, frame] = tokens.as_slice() else {
        return Err(Rejection::TokenCount(tokens.len()));
    };

    let camera_no = camera
        .parse::<u32>()
        .map_err(|_| Rejection::Camera(camera.to_string()))?;
    let frame_no = frame
        .parse::<u64>()
        .map_err(|_| Rejection::Frame(frame.to_string()))?;

    Ok(FrameId::new(*video, camera_no, frame_no))
}

/// Ordered frame index for one run.
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    video: String,
    camera_no: u32,
    entries: BTreeMap<u64, PathBuf>,
    rejected: usize,
}

impl FrameCatalog {
    /// Empty catalog for `video` / `camera_no`.
    pub fn new(video: impl Into<String>, camera_no: u32) -> Self {
        Self {
            video: video.into(),
            camera_no,
            entries: BTreeMap::new(),
            rejected: 0,
        }
    }

    /// List `dir` (no recursion) and catalog every matching frame.
    /// Symlinked frames are catalogued by their link name.
    ///
    /// Entries are visited in file name order, so when two files parse to
    /// the same frame number the result does not depend on the platform's
    /// directory listing order.
    pub fn build(dir: &Path, video: &str, camera_no: u32) -> Result<Self, PipelineError> {
        let frame_dir_error = |message: String| PipelineError::FrameDir {
            path: dir.display().to_string(),
            message,
        };
        let meta = std::fs::metadata(dir).map_err(|e| frame_dir_error(e.to_string()))?;
        if !meta.is_dir() {
            return Err(frame_dir_error("not a directory".to_string()));
        }

        let mut catalog = Self::new(video, camera_no);
        for entry in WalkDir::new(dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    catalog.insert(entry.into_path());
                }
                Ok(entry) => debug!(path = %entry.path().display(), "Skipping non-file entry"),
                Err(e) => warn!(error = %e, "Unreadable directory entry"),
            }
        }

        info!(
            video,
            camera_no,
            accepted = catalog.len(),
            rejected = catalog.rejected,
            "Frame catalog built"
        );
        Ok(catalog)
    }

    /// Add one file. Returns false (and logs) if it is rejected.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        let frame = match parse_frame_name(&path).and_then(|f| self.check_target(f)) {
            Ok(frame) => frame,
            Err(reason) => {
                warn!(path = %path.display(), %reason, "Rejected frame file");
                self.rejected += 1;
                return false;
            }
        };

        if let Some(previous) = self.entries.insert(frame.frame_no, path.clone()) {
            warn!(
                frame_no = frame.frame_no,
                replaced = %previous.display(),
                kept = %path.display(),
                "Duplicate frame number"
            );
        }
        true
    }

    fn check_target(&self, frame: FrameId) -> Result<FrameId, Rejection> {
        if frame.video != self.video {
            return Err(Rejection::Video {
                expected: self.video.clone(),
                found: frame.video,
            });
        }
        if frame.camera_no != self.camera_no {
            return Err(Rejection::CameraMismatch {
                expected: self.camera_no,
                found: frame.camera_no,
            });
        }
        Ok(frame)
    }

    pub fn video(&self) -> &str {
        &self.video
    }

    pub fn camera_no(&self) -> u32 {
        self.camera_no
    }

    /// Ascending frame numbers.
    pub fn frame_numbers(&self) -> Vec<u64> {
        self.entries.keys().copied().collect()
    }

    /// Highest catalogued frame number.
    pub fn last_frame(&self) -> Option<u64> {
        self.entries.keys().next_back().copied()
    }

    pub fn path(&self, frame_no: u64) -> Option<&Path> {
        self.entries.get(&frame_no).map(PathBuf::as_path)
    }

    /// Frame identity for `frame_no` within this catalog's target.
    pub fn frame_id(&self, frame_no: u64) -> FrameId {
        FrameId::new(self.video.clone(), self.camera_no, frame_no)
    }

    /// Entries in ascending frame order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Path)> {
        self.entries.iter().map(|(n, p)| (*n, p.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of files rejected so far.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}
