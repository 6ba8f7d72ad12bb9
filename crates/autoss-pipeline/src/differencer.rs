//! Temporal differencing (pass 2).

use tracing::{error, info, warn};

use autoss_storage::RecordGateway;
use autoss_types::{vector, FrameId, FrameVectorRecord, SequenceInputRecord};

/// `(diffvector, normvector)` for a frame whose successor has `next`.
///
/// `diffvector = next - current`; `normvector` is its unit direction, or
/// the zero vector when nothing changed. Returns `None` if the dimensions
/// differ.
pub fn difference(current: &[f64], next: &[f64]) -> Option<(Vec<f64>, Vec<f64>)> {
    let diff = vector::sub(next, current)?;
    let norm = vector::normalize(&diff);
    Some((diff, norm))
}

/// What happened to one frame in pass 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Written,
    /// No Frame Vector Record for the frame itself
    MissingCurrent,
    /// No Frame Vector Record for the following frame
    MissingNext,
    WriteFailed,
}

/// Pass 2 worker: two Frame Vector Records → one Sequence Input Record.
#[derive(Clone)]
pub struct TemporalDifferencer {
    vectors: RecordGateway<FrameVectorRecord>,
    sequence_inputs: RecordGateway<SequenceInputRecord>,
}

impl TemporalDifferencer {
    pub fn new(
        vectors: RecordGateway<FrameVectorRecord>,
        sequence_inputs: RecordGateway<SequenceInputRecord>,
    ) -> Self {
        Self {
            vectors,
            sequence_inputs,
        }
    }

    /// Difference `frame` against `frame + 1` and store the result.
    pub async fn difference_frame(&self, frame: &FrameId) -> PairOutcome {
        let Some(current) = self.vectors.find_by_key(frame).await else {
            warn!(key = %frame, "Frame vector record not found, skipping");
            return PairOutcome::MissingCurrent;
        };

        let next_frame = frame.successor();
        let Some(next) = self.vectors.find_by_key(&next_frame).await else {
            warn!(key = %next_frame, "Successor frame vector record not found, skipping");
            return PairOutcome::MissingNext;
        };

        let (diff, norm) = match difference(&current.sumvector, &next.sumvector) {
            Some(pair) => pair,
            None => {
                error!(
                    key = %frame,
                    current = current.sumvector.len(),
                    next = next.sumvector.len(),
                    "Sumvector dimension mismatch, writing zero difference"
                );
                let zeros = vector::zeros(current.sumvector.len());
                (zeros.clone(), zeros)
            }
        };

        let record = SequenceInputRecord::new(frame, current.sumvector, diff, norm);
        match self.sequence_inputs.create(&record).await {
            Some(_) => {
                info!(key = %frame, "Sequence input stored");
                PairOutcome::Written
            }
            None => PairOutcome::WriteFailed,
        }
    }
}
