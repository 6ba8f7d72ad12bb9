//! Two-pass frame pipeline.
//!
//! Pass 1 turns every catalogued frame into a Frame Vector Record. Pass 2
//! starts only after pass 1 has finished and reads those records back to
//! build one Sequence Input Record per frame that has a successor.
//!
//! Per-frame failures are logged and counted, never returned.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, info_span, Instrument};

use autoss_embeddings::EmbeddingModel;
use autoss_storage::{DocumentStore, RecordGateway};
use autoss_vision::Tagger;

use crate::aggregator::{FrameOutcome, FrameVectorizer};
use crate::catalog::FrameCatalog;
use crate::differencer::{PairOutcome, TemporalDifferencer};
use crate::error::PipelineError;

/// Which passes a run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pass {
    #[default]
    All,
    /// Pass 1 only
    Vectorize,
    /// Pass 2 only, over records from an earlier run
    Difference,
}

impl Pass {
    fn vectorizes(self) -> bool {
        matches!(self, Pass::All | Pass::Vectorize)
    }

    fn differences(self) -> bool {
        matches!(self, Pass::All | Pass::Difference)
    }
}

/// Configuration for the frame pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Frames processed at once within a pass
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl PipelineConfig {
    /// Set the per-pass concurrency (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Counters for one run. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Frames accepted into the catalog
    pub frames_catalogued: usize,
    /// Files rejected by the catalog
    pub files_rejected: usize,
    /// Frame Vector Records created
    pub vectors_written: usize,
    /// Frame Vector Records that failed to store
    pub vector_write_failures: usize,
    /// Frames whose image could not be read or tagged
    pub tag_failures: usize,
    /// Frames with no resolved tag
    pub tagless_frames: usize,
    /// Tags without an embedding
    pub tags_dropped: usize,
    /// Sequence Input Records created
    pub sequence_inputs_written: usize,
    /// Frames skipped in pass 2 for a missing record
    pub pairs_skipped: usize,
    /// Sequence Input Records that failed to store
    pub sequence_write_failures: usize,
}

impl RunReport {
    fn add_frame(&mut self, outcome: &FrameOutcome) {
        if outcome.written {
            self.vectors_written += 1;
        } else {
            self.vector_write_failures += 1;
        }
        self.tag_failures += usize::from(outcome.tag_failed);
        self.tagless_frames += usize::from(outcome.tagless);
        self.tags_dropped += outcome.tags_dropped;
    }

    fn add_pair(&mut self, outcome: PairOutcome) {
        match outcome {
            PairOutcome::Written => self.sequence_inputs_written += 1,
            PairOutcome::MissingCurrent | PairOutcome::MissingNext => self.pairs_skipped += 1,
            PairOutcome::WriteFailed => self.sequence_write_failures += 1,
        }
    }
}

/// Frame vectorization and temporal differencing for one (video, camera).
pub struct Pipeline {
    vectorizer: FrameVectorizer,
    differencer: TemporalDifferencer,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline over the two collections.
    pub fn new(
        tagger: Arc<dyn Tagger>,
        model: Arc<dyn EmbeddingModel>,
        vectors: Arc<dyn DocumentStore>,
        sequence_inputs: Arc<dyn DocumentStore>,
        config: PipelineConfig,
    ) -> Self {
        let vector_gateway = RecordGateway::new(vectors);
        Self {
            vectorizer: FrameVectorizer::new(tagger, model, vector_gateway.clone()),
            differencer: TemporalDifferencer::new(
                vector_gateway,
                RecordGateway::new(sequence_inputs),
            ),
            config,
        }
    }

    /// Catalog `frame_dir` and run the selected passes over it.
    ///
    /// Fails only if the frame directory cannot be listed.
    pub async fn run(
        &self,
        frame_dir: &Path,
        video: &str,
        camera_no: u32,
        pass: Pass,
    ) -> Result<RunReport, PipelineError> {
        let span = info_span!("run", video, camera_no);
        async {
            let catalog = FrameCatalog::build(frame_dir, video, camera_no)?;
            let mut report = RunReport {
                frames_catalogued: catalog.len(),
                files_rejected: catalog.rejected(),
                ..RunReport::default()
            };

            if pass.vectorizes() {
                self.vectorize(&catalog, &mut report).await;
            }
            if pass.differences() {
                self.difference(&catalog, &mut report).await;
            }

            info!(
                frames = report.frames_catalogued,
                vectors = report.vectors_written,
                sequence_inputs = report.sequence_inputs_written,
                skipped = report.pairs_skipped,
                "Done"
            );
            Ok::<_, PipelineError>(report)
        }
        .instrument(span)
        .await
    }

    /// Pass 1 over every catalogued frame, in ascending frame order.
    pub async fn vectorize(&self, catalog: &FrameCatalog, report: &mut RunReport) {
        let span = info_span!("vectorize", frames = catalog.len());
        let outcomes: Vec<FrameOutcome> = stream::iter(catalog.iter())
            .map(|(frame_no, path)| {
                let frame = catalog.frame_id(frame_no);
                let frame_span = info_span!("frame", frame_no);
                async move { self.vectorizer.vectorize(&frame, path).await }
                    .instrument(frame_span)
            })
            .buffered(self.config.concurrency)
            .collect()
            .instrument(span)
            .await;

        for outcome in &outcomes {
            report.add_frame(outcome);
        }
    }

    /// Pass 2 over every catalogued frame below the last one.
    pub async fn difference(&self, catalog: &FrameCatalog, report: &mut RunReport) {
        let Some(last) = catalog.last_frame() else {
            return;
        };
        let frames: Vec<u64> = catalog
            .frame_numbers()
            .into_iter()
            .take_while(|frame_no| *frame_no != last)
            .collect();

        let span = info_span!("difference", pairs = frames.len());
        let outcomes: Vec<PairOutcome> = stream::iter(frames)
            .map(|frame_no| {
                let frame = catalog.frame_id(frame_no);
                let frame_span = info_span!("frame", frame_no);
                async move { self.differencer.difference_frame(&frame).await }
                    .instrument(frame_span)
            })
            .buffered(self.config.concurrency)
            .collect()
            .instrument(span)
            .await;

        for outcome in outcomes {
            report.add_pair(outcome);
        }
    }
}
