//! # autoss-pipeline
//!
//! Frame vectorization and temporal differencing for one (video, camera).
//!
//! - [`FrameCatalog`]: validated, ordered frame index of a directory
//! - [`FrameVectorizer`]: pass 1, tags + embeddings → Frame Vector Record
//! - [`TemporalDifferencer`]: pass 2, consecutive records → Sequence Input Record
//! - [`Pipeline`]: runs the passes in order and returns a [`RunReport`]

pub mod aggregator;
pub mod catalog;
pub mod differencer;
pub mod error;
pub mod pipeline;

pub use aggregator::{aggregate_tags, FrameOutcome, FrameVectorizer, TagAggregate};
pub use catalog::{parse_frame_name, FrameCatalog, Rejection, FRAME_EXTENSION};
pub use differencer::{difference, PairOutcome, TemporalDifferencer};
pub use error::PipelineError;
pub use pipeline::{Pass, Pipeline, PipelineConfig, RunReport};
