//! Persisted record types.
//!
//! Both record kinds carry the frame identity as strings (`camera_no` and
//! `frame_no` included) because that is the shape the record store queries
//! by. Unknown fields added by a backend (e.g. Cosmos `_rid`, `_ts`) are
//! ignored on read.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::frame::FrameId;

/// Logical collection a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Per-frame aggregate tag vectors (pass 1 output)
    Vectors,
    /// Per-frame temporal difference signals (pass 2 output)
    SequenceInputs,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Vectors => "vectors",
            Collection::SequenceInputs => "sequence-inputs",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A record that can be stored in and read back from a collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    /// Collection this record type belongs to.
    const COLLECTION: Collection;

    /// Derived key (`{video}_{camera}_{frame}`).
    fn id(&self) -> &str;
}

/// Aggregate tag embedding of one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameVectorRecord {
    pub id: String,
    pub video: String,
    pub camera_no: String,
    pub frame_no: String,
    /// Resolved tag → embedding vector
    pub vectors: BTreeMap<String, Vec<f64>>,
    /// Elementwise sum of all resolved tag vectors
    pub sumvector: Vec<f64>,
    /// Tags that resolved, in Tag Set order
    pub tags: Vec<String>,
}

impl FrameVectorRecord {
    pub fn new(
        frame: &FrameId,
        vectors: BTreeMap<String, Vec<f64>>,
        sumvector: Vec<f64>,
        tags: Vec<String>,
    ) -> Self {
        Self {
            id: frame.key(),
            video: frame.video.clone(),
            camera_no: frame.camera_str(),
            frame_no: frame.frame_str(),
            vectors,
            sumvector,
            tags,
        }
    }
}

impl Record for FrameVectorRecord {
    const COLLECTION: Collection = Collection::Vectors;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Difference signal between a frame and its successor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceInputRecord {
    pub id: String,
    pub video: String,
    pub camera_no: String,
    pub frame_no: String,
    /// Copy of the current frame's sumvector
    pub sumvector: Vec<f64>,
    /// successor.sumvector - current.sumvector
    pub diffvector: Vec<f64>,
    /// diffvector scaled to unit length (zero stays zero)
    pub normvector: Vec<f64>,
}

impl SequenceInputRecord {
    pub fn new(
        frame: &FrameId,
        sumvector: Vec<f64>,
        diffvector: Vec<f64>,
        normvector: Vec<f64>,
    ) -> Self {
        Self {
            id: frame.key(),
            video: frame.video.clone(),
            camera_no: frame.camera_str(),
            frame_no: frame.frame_str(),
            sumvector,
            diffvector,
            normvector,
        }
    }
}

impl Record for SequenceInputRecord {
    const COLLECTION: Collection = Collection::SequenceInputs;

    fn id(&self) -> &str {
        &self.id
    }
}
