use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use notebook_core::{IngestConfig, Orchestrator, ProgressReporter, Retriever, Stage};
use notebook_server::StartupConfig;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// notebook — document ingestion and retrieval pipeline
#[derive(Parser)]
#[command(name = "notebook", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a PDF or DOCX file into the vector store
    Ingest(IngestArgs),
    /// Retrieve text and image chunks for a question
    Retrieve(RetrieveArgs),
    /// Start the web dashboard API server
    Serve(ServeArgs),
}

#[derive(Parser)]
struct IngestArgs {
    /// Path to a PDF or DOCX file
    #[arg(short, long)]
    input: PathBuf,

    /// Static root directory for originals and extracted images
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,
}

#[derive(Parser)]
struct RetrieveArgs {
    /// The question to answer
    question: String,

    /// Restrict the search to these source ids (defaults to all sources)
    #[arg(long)]
    source: Vec<Uuid>,
}

#[derive(Parser)]
struct ServeArgs {
    /// Bind address
    #[arg(long, default_value = "0.0.0.0:3000")]
    bind: String,

    /// Static root directory for originals and extracted images
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,
}

/// CLI progress reporter driving an indicatif bar across the ingestion
/// state machine's fixed stage sequence (§4.8).
struct CliProgressReporter {
    bar: ProgressBar,
}

const STAGE_COUNT: u64 = 10;

impl CliProgressReporter {
    fn new() -> Self {
        let bar = ProgressBar::new(STAGE_COUNT);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
                .unwrap()
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        Self { bar }
    }
}

impl ProgressReporter for CliProgressReporter {
    fn on_stage(&self, source_id: &str, stage: Stage) {
        self.bar.set_message(format!("{source_id}: {}", stage.as_str()));
        self.bar.inc(1);
    }

    fn on_unit_skipped(&self, _source_id: &str, unit: &str, reason: &str) {
        self.bar.println(format!("  skipped {unit}: {reason}"));
    }

    fn on_finished(&self, source_id: &str, stage: Stage, skipped_units: u32) {
        self.bar.finish_with_message(format!(
            "{source_id}: {} ({skipped_units} unit(s) skipped)",
            stage.as_str()
        ));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest(args) => run_ingest(args).await?,
        Commands::Retrieve(args) => run_retrieve(args).await?,
        Commands::Serve(args) => run_serve(args).await?,
    }

    Ok(())
}

/// Build the gateway/vector-store/cache stack from the environment,
/// mirroring `notebook_server::AppState::bootstrap` but with a
/// caller-supplied [`ProgressReporter`] instead of the job-queue bridge.
async fn build_orchestrator_and_retriever(
    output: &std::path::Path,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<(Arc<Orchestrator>, Arc<Retriever>)> {
    let config = StartupConfig::from_env(output.join(".uploads"), output.to_path_buf());

    let model = config
        .model
        .clone()
        .unwrap_or_else(|| notebook_gateway::default_model(&config.provider).to_string());
    let (text, vision) = notebook_gateway::create_provider(&config.provider, &model)?;
    let embedding = notebook_gateway::OpenAiCompatibleEmbedding::new(
        config.embedding_base_url.clone(),
        config.embedding_model.clone(),
        config.embedding_dim as usize,
    );
    let gateway = Arc::new(notebook_gateway::Gateway::new(
        text.into(),
        vision.into(),
        Arc::new(embedding),
        notebook_gateway::GatewayConfig::default(),
    ));

    let cache = match &config.redis_url {
        Some(url) => notebook_cache::Cache::connect(url).await.ok().map(Arc::new),
        None => None,
    };

    let vector_store = Arc::new(
        notebook_vectorstore::VectorStoreAdapter::connect(notebook_vectorstore::VectorStoreConfig {
            qdrant_url: config.qdrant_url.clone(),
            collection_name: config.qdrant_collection.clone(),
            embedding_dim: config.embedding_dim,
            ..notebook_vectorstore::VectorStoreConfig::default()
        })
        .await?,
    );

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&gateway),
        cache,
        vector_store.clone(),
        IngestConfig::default(),
        reporter,
    ));
    let retriever = Arc::new(Retriever::new(gateway, vector_store));

    Ok((orchestrator, retriever))
}

async fn run_ingest(args: IngestArgs) -> Result<()> {
    tokio::fs::create_dir_all(&args.output).await?;

    let reporter: Arc<dyn ProgressReporter> = Arc::new(CliProgressReporter::new());
    let (orchestrator, _retriever) = build_orchestrator_and_retriever(&args.output, reporter).await?;

    let source_id = Uuid::new_v4();
    let filename = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();
    let output_dir = args.output.join(source_id.to_string());

    let outcome = orchestrator
        .ingest(source_id, &args.input, &output_dir, &filename)
        .await?;

    println!();
    println!("source id: {source_id}");
    println!("documents indexed: {}", outcome.documents_indexed);
    if !outcome.skipped_units.is_empty() {
        println!("skipped units: {}", outcome.skipped_units.len());
    }

    Ok(())
}

async fn run_retrieve(args: RetrieveArgs) -> Result<()> {
    let reporter: Arc<dyn ProgressReporter> = Arc::new(notebook_core::SilentReporter);
    let output = PathBuf::from("./output");
    let (_orchestrator, retriever) = build_orchestrator_and_retriever(&output, reporter).await?;

    let result = retriever
        .retrieve(&args.question, &args.source)
        .await
        .map_err(anyhow::Error::msg)?;

    println!("{}", serde_json::to_string_pretty(&serde_json::json!({
        "texts": result.texts,
        "images": result.images,
    }))?);

    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    tokio::fs::create_dir_all(&args.output).await?;
    let upload_dir = args.output.join(".uploads");
    tokio::fs::create_dir_all(&upload_dir).await?;

    let config = StartupConfig::from_env(upload_dir, args.output.clone());
    let db_path = args.output.join("jobs.sqlite3");
    let state = notebook_server::AppState::bootstrap(config, &db_path).await?;
    let app = notebook_server::create_app(state);

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    println!();
    println!("notebook — web dashboard");
    println!("  API:    http://{}", args.bind);
    println!("  Static: {}", args.output.display());
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}
