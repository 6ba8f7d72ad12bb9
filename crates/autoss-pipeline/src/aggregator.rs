//! Frame vector aggregation (pass 1).
//!
//! Tags a frame image, resolves each tag to its embedding and sums the
//! resolved vectors into the frame's `sumvector`.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use autoss_embeddings::EmbeddingModel;
use autoss_storage::RecordGateway;
use autoss_types::{vector, FrameId, FrameVectorRecord};
use autoss_vision::Tagger;

/// Resolved tags of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TagAggregate {
    /// Resolved tag → embedding
    pub vectors: BTreeMap<String, Vec<f64>>,
    /// Elementwise sum of the resolved embeddings
    pub sumvector: Vec<f64>,
    /// Resolved tags in input order
    pub tags: Vec<String>,
    /// Tags with no embedding
    pub dropped: Vec<String>,
}

/// Resolve `tags` against `model` and sum the vectors that resolve.
///
/// Unknown tokens are logged and left out of every output field. With no
/// resolved tag the sum is the zero vector of the model's dimension.
pub fn aggregate_tags(tags: &[String], model: &dyn EmbeddingModel) -> TagAggregate {
    let mut aggregate = TagAggregate {
        vectors: BTreeMap::new(),
        sumvector: vector::zeros(model.dimension()),
        tags: Vec::new(),
        dropped: Vec::new(),
    };

    for tag in tags {
        let Some(embedding) = model.lookup(tag) else {
            warn!(tag = %tag, "Tag not in embedding vocabulary");
            aggregate.dropped.push(tag.clone());
            continue;
        };

        let values = embedding.to_f64();
        if !vector::add_assign(&mut aggregate.sumvector, &values) {
            warn!(
                tag = %tag,
                expected = aggregate.sumvector.len(),
                actual = values.len(),
                "Embedding dimension mismatch"
            );
            aggregate.dropped.push(tag.clone());
            continue;
        }

        debug!(tag = %tag, "Resolved tag");
        aggregate.vectors.insert(tag.clone(), values);
        aggregate.tags.push(tag.clone());
    }

    aggregate
}

/// What happened to one frame in pass 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Record was created
    pub written: bool,
    /// Image could not be read or tagging failed
    pub tag_failed: bool,
    /// Frame ended up with no resolved tag
    pub tagless: bool,
    /// Tags dropped for lack of an embedding
    pub tags_dropped: usize,
}

/// Pass 1 worker: image → tags → embeddings → Frame Vector Record.
#[derive(Clone)]
pub struct FrameVectorizer {
    tagger: Arc<dyn Tagger>,
    model: Arc<dyn EmbeddingModel>,
    vectors: RecordGateway<FrameVectorRecord>,
}

impl FrameVectorizer {
    pub fn new(
        tagger: Arc<dyn Tagger>,
        model: Arc<dyn EmbeddingModel>,
        vectors: RecordGateway<FrameVectorRecord>,
    ) -> Self {
        Self {
            tagger,
            model,
            vectors,
        }
    }

    /// Tag Set for the image at `path`, or `None` (logged) if the image
    /// could not be read or tagged.
    async fn tags_for(&self, path: &Path) -> Option<Vec<String>> {
        let image = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read frame image");
                return None;
            }
        };

        match self.tagger.tag_image(&image).await {
            Ok(tags) => Some(tags),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Tagging failed, treating frame as tagless");
                None
            }
        }
    }

    /// Build and store the Frame Vector Record for `frame`.
    pub async fn vectorize(&self, frame: &FrameId, path: &Path) -> FrameOutcome {
        let (tags, tag_failed) = match self.tags_for(path).await {
            Some(tags) => (tags, false),
            None => (Vec::new(), true),
        };

        let aggregate = aggregate_tags(&tags, self.model.as_ref());
        let outcome = FrameOutcome {
            written: false,
            tag_failed,
            tagless: aggregate.tags.is_empty(),
            tags_dropped: aggregate.dropped.len(),
        };

        let record = FrameVectorRecord::new(
            frame,
            aggregate.vectors,
            aggregate.sumvector,
            aggregate.tags,
        );
        let written = self.vectors.create(&record).await.is_some();
        if written {
            info!(key = %frame, tags = ?record.tags, "Frame vector stored");
        }

        FrameOutcome { written, ..outcome }
    }
}
