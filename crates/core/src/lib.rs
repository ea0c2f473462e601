pub mod captioner;
pub mod config;
pub mod contextual;
pub mod error;
pub mod extractor;
pub mod json_util;
pub mod model;
pub mod orchestrator;
pub mod progress;
pub mod prompts;
pub mod retriever;
pub mod segmenter;
pub mod splitter;
pub mod text_cleanup;
pub mod trash;
pub mod tree;
pub mod vector_sink;

pub use config::{IngestConfig, Language};
pub use error::{CoreError, CoreResult};
pub use model::{Document, DocumentMetadata, DocumentType, Node, NodeLabel, Source, VectorPoint};
pub use orchestrator::{IngestOutcome, Orchestrator};
pub use progress::{ProgressReporter, SilentReporter, Stage, TracingReporter};
pub use retriever::{RetrievalResult, Retriever, RetrievedImage, RetrievedText};
pub use vector_sink::{SearchHit, VectorSearch, VectorSink};
