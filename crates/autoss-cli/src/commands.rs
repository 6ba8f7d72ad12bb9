//! Run wiring.
//!
//! 1. Load configuration (defaults -> file -> env -> CLI)
//! 2. Build the run's tracing subscriber
//! 3. Load the embedding model, build the tagger, open both collections
//! 4. Run the pipeline with the subscriber attached

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::instrument::WithSubscriber;
use tracing::{info, Dispatch};

use autoss_embeddings::{EmbeddingModel, Word2VecModel};
use autoss_pipeline::{Pipeline, PipelineConfig, RunReport};
use autoss_storage::{CosmosStore, DocumentStore, RocksStore};
use autoss_types::{Collection, RecordStoreKind, Settings};
use autoss_vision::{ComputerVisionConfig, ComputerVisionTagger, Tagger};

use crate::cli::Cli;
use crate::logging;

/// Per-request timeout for Cosmos DB calls.
const STORE_TIMEOUT: Duration = Duration::from_secs(60);

/// Load settings and apply CLI overrides.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        settings.concurrency = concurrency;
    }
    Ok(settings)
}

/// Open the vectors and sequence-inputs collections.
pub fn open_stores(
    settings: &Settings,
) -> Result<(Arc<dyn DocumentStore>, Arc<dyn DocumentStore>)> {
    match settings.record_store {
        RecordStoreKind::Cosmos => {
            let open = |collection: Collection| -> Result<Arc<dyn DocumentStore>> {
                let target = settings.cosmos_target(collection)?;
                let store: Arc<dyn DocumentStore> = Arc::new(
                    CosmosStore::new(target, STORE_TIMEOUT).with_context(|| {
                        format!("Failed to set up Cosmos DB {} container", collection)
                    })?,
                );
                Ok(store)
            };
            Ok((open(Collection::Vectors)?, open(Collection::SequenceInputs)?))
        }
        RecordStoreKind::Rocksdb => {
            let path = settings.expanded_rocksdb_path();
            info!(path = %path.display(), "Opening record store");
            let db = RocksStore::open(&path)
                .with_context(|| format!("Failed to open record store at {}", path.display()))?;
            let vectors: Arc<dyn DocumentStore> = Arc::new(db.collection(Collection::Vectors));
            let sequence_inputs: Arc<dyn DocumentStore> =
                Arc::new(db.collection(Collection::SequenceInputs));
            Ok((vectors, sequence_inputs))
        }
    }
}

fn build_pipeline(settings: &Settings) -> Result<Pipeline> {
    settings.validate().context("Invalid configuration")?;

    let model_path = settings
        .model_path()
        .context("word2vec_model_file is not set")?;
    info!(path = %model_path.display(), "Loading embedding model");
    let model: Arc<dyn EmbeddingModel> = Arc::new(
        Word2VecModel::load(&model_path)
            .with_context(|| format!("Failed to load embedding model {}", model_path.display()))?,
    );

    let vision = ComputerVisionConfig::from_settings(settings)
        .context("Invalid Computer Vision configuration")?;
    let tagger: Arc<dyn Tagger> =
        Arc::new(ComputerVisionTagger::new(vision).context("Failed to build tagger")?);

    let (vectors, sequence_inputs) = open_stores(settings)?;
    info!(
        vectors = vectors.name(),
        sequence_inputs = sequence_inputs.name(),
        "Record store ready"
    );

    Ok(Pipeline::new(
        tagger,
        model,
        vectors,
        sequence_inputs,
        PipelineConfig::default().with_concurrency(settings.concurrency),
    ))
}

/// Run one (video, camera) invocation.
pub async fn run(cli: Cli) -> Result<RunReport> {
    let settings = load_settings(&cli)?;
    let dispatch: Dispatch = logging::build_dispatch(&settings)?;

    let pipeline = {
        let _guard = tracing::dispatcher::set_default(&dispatch);
        info!(
            video = %cli.name,
            camera_no = cli.camerano,
            frame_dir = %cli.framedir.display(),
            log_level = %settings.log_level,
            "autoss starting"
        );
        build_pipeline(&settings)?
    };

    let report = pipeline
        .run(&cli.framedir, &cli.name, cli.camerano, cli.pass.into())
        .with_subscriber(dispatch)
        .await
        .context("Run aborted")?;
    Ok(report)
}
