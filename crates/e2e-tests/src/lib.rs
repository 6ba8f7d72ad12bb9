//! End-to-end test infrastructure for autoss.
//!
//! Provides a shared TestHarness: a frame directory, a word2vec model file
//! on disk, a mocked Computer Vision endpoint and a RocksDB record store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_bytes, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use autoss_embeddings::Word2VecModel;
use autoss_pipeline::{Pipeline, PipelineConfig};
use autoss_storage::{RecordGateway, RocksStore};
use autoss_types::{Collection, FrameVectorRecord, SequenceInputRecord};
use autoss_vision::{ComputerVisionConfig, ComputerVisionTagger};

/// Embedding dimension of the reference deployment.
pub const DIMENSION: usize = 100;

/// Analyze endpoint path served by the mock.
pub const ANALYZE_PATH: &str = "/vision/v2.0/analyze";

/// Tagger timeout used by the harness.
pub const TAGGER_TIMEOUT: Duration = Duration::from_millis(500);

/// Vector of `DIMENSION` zeros with `value` at `index`.
pub fn one_hot(index: usize, value: f64) -> Vec<f64> {
    let mut v = vec![0.0; DIMENSION];
    v[index] = value;
    v
}

/// Write a text-format word2vec file with a `<count> <dim>` header.
pub fn write_text_model(path: &Path, entries: &[(&str, Vec<f64>)]) {
    let mut body = format!("{} {}\n", entries.len(), DIMENSION);
    for (token, values) in entries {
        body.push_str(token);
        for v in values {
            body.push_str(&format!(" {}", v));
        }
        body.push('\n');
    }
    std::fs::write(path, body).expect("Failed to write model file");
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Directory holding frame images
    pub frame_dir: PathBuf,
    /// word2vec model file
    pub model_path: PathBuf,
    /// RocksDB directory
    pub db_path: PathBuf,
    /// Mocked Computer Vision service
    pub server: MockServer,
}

impl TestHarness {
    /// Harness whose model maps "car" to [1, 0, ..., 0] and "road" to
    /// [0, 1, 0, ..., 0].
    pub async fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let frame_dir = temp_dir.path().join("frames");
        std::fs::create_dir_all(&frame_dir).expect("Failed to create frame dir");

        let model_path = temp_dir.path().join("word2vec.txt");
        write_text_model(
            &model_path,
            &[("car", one_hot(0, 1.0)), ("road", one_hot(1, 1.0))],
        );

        let db_path = temp_dir.path().join("records");

        Self {
            _temp_dir: temp_dir,
            frame_dir,
            model_path,
            db_path,
            server: MockServer::start().await,
        }
    }

    /// Write a frame image. The content doubles as the key the mocked
    /// service answers by.
    pub fn add_frame(&self, name: &str, content: &[u8]) {
        std::fs::write(self.frame_dir.join(name), content).expect("Failed to write frame");
    }

    /// Answer analyze calls for `image` with `tags`.
    pub async fn tag_image(&self, image: &[u8], tags: &[&str]) {
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .and(body_bytes(image.to_vec()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "description": { "tags": tags, "captions": [] },
                "requestId": "00000000-0000-0000-0000-000000000000",
                "metadata": { "width": 640, "height": 480, "format": "Jpeg" }
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer analyze calls for `image` slower than the tagger timeout.
    pub async fn stall_image(&self, image: &[u8]) {
        Mock::given(method("POST"))
            .and(path(ANALYZE_PATH))
            .and(body_bytes(image.to_vec()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(TAGGER_TIMEOUT * 4)
                    .set_body_json(json!({ "description": { "tags": ["car"] } })),
            )
            .mount(&self.server)
            .await;
    }

    /// Expect no analyze call for `image`.
    pub async fn never_tag(&self, image: &[u8]) {
        Mock::given(method("POST"))
            .and(body_bytes(image.to_vec()))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    /// Open the harness record store.
    pub fn open_store(&self) -> RocksStore {
        RocksStore::open(&self.db_path).expect("Failed to open record store")
    }

    /// Pipeline over the harness model, mock service and `store`.
    pub fn pipeline(&self, store: &RocksStore) -> Pipeline {
        let model = Word2VecModel::load(&self.model_path).expect("Failed to load model");
        let tagger = ComputerVisionTagger::new(
            ComputerVisionConfig::new(self.server.uri(), "test-subscription-key")
                .with_timeout(TAGGER_TIMEOUT),
        )
        .expect("Failed to build tagger");

        Pipeline::new(
            Arc::new(tagger),
            Arc::new(model),
            Arc::new(store.collection(Collection::Vectors)),
            Arc::new(store.collection(Collection::SequenceInputs)),
            PipelineConfig::default(),
        )
    }

    /// Typed access to the vectors collection.
    pub fn vectors(store: &RocksStore) -> RecordGateway<FrameVectorRecord> {
        RecordGateway::new(Arc::new(store.collection(Collection::Vectors)))
    }

    /// Typed access to the sequence-inputs collection.
    pub fn sequence_inputs(store: &RocksStore) -> RecordGateway<SequenceInputRecord> {
        RecordGateway::new(Arc::new(store.collection(Collection::SequenceInputs)))
    }
}
