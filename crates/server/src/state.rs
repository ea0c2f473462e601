use crate::jobs::queue::JobQueue;
use crate::jobs::runner::QueueProgressReporter;
use notebook_cache::Cache;
use notebook_core::{IngestConfig, Orchestrator, Retriever};
use notebook_gateway::{
    create_provider, default_model, Gateway, GatewayConfig, OpenAiCompatibleEmbedding,
};
use notebook_storage::{LocalStorage, StorageBackend};
use notebook_vectorstore::{VectorStoreAdapter, VectorStoreConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state: the process-wide Gateway, vector store, and
/// cache singletons (§9 Design Notes), plus the SQLite-backed job queue.
#[derive(Clone)]
pub struct AppState {
    pub job_queue: JobQueue,
    pub orchestrator: Arc<Orchestrator>,
    pub retriever: Arc<Retriever>,
    /// Directory uploads are written to before ingestion moves them under `static_dir`.
    pub upload_dir: PathBuf,
    /// Static root serving `{source_uuid}.{ext}` originals and `{source_uuid}/image_p*` assets.
    pub static_dir: PathBuf,
    /// Backend for persisting uploaded originals, rooted at `upload_dir`.
    pub storage: Arc<dyn StorageBackend>,
}

/// Startup configuration, sourced from the environment the way the teacher's
/// provider `check()` methods read `ANTHROPIC_API_KEY`/`OPENAI_API_KEY`/
/// `OLLAMA_HOST` (§A.4).
pub struct StartupConfig {
    pub provider: String,
    pub model: Option<String>,
    pub embedding_model: String,
    pub embedding_dim: u64,
    pub embedding_base_url: String,
    pub qdrant_url: String,
    pub qdrant_collection: String,
    pub redis_url: Option<String>,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl StartupConfig {
    pub fn from_env(upload_dir: PathBuf, static_dir: PathBuf) -> Self {
        Self {
            provider: std::env::var("NOTEBOOK_PROVIDER").unwrap_or_else(|_| "ollama".to_string()),
            model: std::env::var("NOTEBOOK_MODEL").ok(),
            embedding_model: std::env::var("NOTEBOOK_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_dim: std::env::var("NOTEBOOK_EMBEDDING_DIM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1536),
            embedding_base_url: std::env::var("NOTEBOOK_EMBEDDING_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            qdrant_url: std::env::var("QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6334".to_string()),
            qdrant_collection: std::env::var("QDRANT_COLLECTION")
                .unwrap_or_else(|_| "notebook".to_string()),
            redis_url: std::env::var("REDIS_URL").ok(),
            upload_dir,
            static_dir,
        }
    }
}

impl AppState {
    pub async fn bootstrap(
        config: StartupConfig,
        db_path: &std::path::Path,
    ) -> anyhow::Result<Arc<Self>> {
        tokio::fs::create_dir_all(&config.upload_dir).await?;
        tokio::fs::create_dir_all(&config.static_dir).await?;

        let model = config
            .model
            .clone()
            .unwrap_or_else(|| default_model(&config.provider).to_string());
        let (text, vision) = create_provider(&config.provider, &model)?;
        let embedding = OpenAiCompatibleEmbedding::new(
            config.embedding_base_url.clone(),
            config.embedding_model.clone(),
            config.embedding_dim as usize,
        );
        let gateway = Arc::new(Gateway::new(
            text.into(),
            vision.into(),
            Arc::new(embedding),
            GatewayConfig::default(),
        ));

        let cache: Option<Arc<Cache>> = match &config.redis_url {
            Some(url) => match Cache::connect(url).await {
                Ok(cache) => Some(Arc::new(cache)),
                Err(e) => {
                    tracing::warn!("cache disabled, failed to connect to {url}: {e}");
                    None
                }
            },
            None => None,
        };

        let vector_store = Arc::new(
            VectorStoreAdapter::connect(VectorStoreConfig {
                qdrant_url: config.qdrant_url.clone(),
                collection_name: config.qdrant_collection.clone(),
                embedding_dim: config.embedding_dim,
                ..VectorStoreConfig::default()
            })
            .await?,
        );

        let storage: Arc<dyn StorageBackend> =
            Arc::new(LocalStorage::new(config.upload_dir.clone(), String::new()));

        let job_queue = JobQueue::new(db_path)?;
        let reporter = Arc::new(QueueProgressReporter::new(job_queue.clone()));

        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&gateway),
            cache,
            vector_store.clone(),
            IngestConfig::default(),
            reporter,
        ));
        let retriever = Arc::new(Retriever::new(gateway, vector_store));

        Ok(Arc::new(Self {
            job_queue,
            orchestrator,
            retriever,
            upload_dir: config.upload_dir,
            static_dir: config.static_dir,
            storage,
        }))
    }
}
