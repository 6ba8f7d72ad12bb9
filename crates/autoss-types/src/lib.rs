//! # autoss-types
//!
//! Shared domain types for the autoss frame vectorization pipeline.
//!
//! - Frame identity: `(video, camera_no, frame_no)` and its derived key
//! - Records: per-frame tag vectors and per-frame sequence inputs
//! - Vector arithmetic used by aggregation and differencing
//! - Settings: typed configuration loaded once per process

pub mod config;
pub mod error;
pub mod frame;
pub mod record;
pub mod vector;

pub use config::{
    level_directive, CosmosTarget, RecordStoreKind, Settings, TagFeature, CONFIG_SECTION,
    DEFAULT_CONFIG_FILE,
};
pub use error::TypesError;
pub use frame::FrameId;
pub use record::{Collection, FrameVectorRecord, Record, SequenceInputRecord};
